//! Database schema and operations

use std::str::FromStr;

use anyhow::Result;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::intake::{NewCreditApplication, NewLead, NewOrder};
use crate::models::{
    ApplicationStatus, Counts, CreditApplication, FormSubmission, Lead, Order, OrderStatus,
};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Contact requests from landing page forms
        CREATE TABLE IF NOT EXISTS leads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            message TEXT,
            source_page TEXT,
            interest TEXT,
            created_at TEXT NOT NULL
        );

        -- Delivery orders; liters is NULL for a fill
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT,
            address TEXT NOT NULL,
            town TEXT NOT NULL,
            liters TEXT,
            fill_tank INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS credit_applications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL,
            address TEXT NOT NULL,
            years_at_address INTEGER,
            employer TEXT,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- Completion events from embedded payment and signup forms
        CREATE TABLE IF NOT EXISTS form_submissions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            form TEXT NOT NULL,
            submission_id TEXT NOT NULL,
            email TEXT,
            received_at TEXT NOT NULL,
            UNIQUE (form, submission_id)
        );

        CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
        CREATE INDEX IF NOT EXISTS idx_credit_applications_status ON credit_applications(status);
        "#,
    )?;
    Ok(())
}

/// Parse a TEXT column through `FromStr`, reporting failures as conversion errors
fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
    }
}

const LEAD_COLUMNS: &str = "id, name, email, phone, message, source_page, interest, created_at";

fn lead_from_row(row: &Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        message: row.get(4)?,
        source_page: row.get(5)?,
        interest: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Store a validated lead and return it with its id
pub fn insert_lead(conn: &Connection, lead: &NewLead) -> Result<Lead> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO leads (name, email, phone, message, source_page, interest, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            &lead.name,
            &lead.email,
            &lead.phone,
            &lead.message,
            &lead.source_page,
            &lead.interest,
            now,
        ),
    )?;
    Ok(Lead {
        id: conn.last_insert_rowid(),
        name: lead.name.clone(),
        email: lead.email.clone(),
        phone: lead.phone.clone(),
        message: lead.message.clone(),
        source_page: lead.source_page.clone(),
        interest: lead.interest.clone(),
        created_at: now,
    })
}

/// List all leads, newest first
pub fn list_leads(conn: &Connection) -> Result<Vec<Lead>> {
    let mut stmt = conn.prepare(&format!("SELECT {LEAD_COLUMNS} FROM leads ORDER BY id DESC"))?;
    let rows = stmt.query_map([], lead_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

const ORDER_COLUMNS: &str =
    "id, name, phone, email, address, town, liters, fill_tank, notes, status, created_at, updated_at";

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        address: row.get(4)?,
        town: row.get(5)?,
        liters: parse_optional_decimal(row, 6)?,
        fill_tank: row.get(7)?,
        notes: row.get(8)?,
        status: parse_column(row, 9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Store a validated order as pending
pub fn insert_order(conn: &Connection, order: &NewOrder) -> Result<Order> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO orders (name, phone, email, address, town, liters, fill_tank, notes, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        (
            &order.name,
            &order.phone,
            &order.email,
            &order.address,
            &order.town,
            order.liters.map(|l| l.to_string()),
            order.fill_tank,
            &order.notes,
            OrderStatus::Pending.as_str(),
            now,
        ),
    )?;
    Ok(Order {
        id: conn.last_insert_rowid(),
        name: order.name.clone(),
        phone: order.phone.clone(),
        email: order.email.clone(),
        address: order.address.clone(),
        town: order.town.clone(),
        liters: order.liters,
        fill_tank: order.fill_tank,
        notes: order.notes.clone(),
        status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_order(conn: &Connection, id: i64) -> Result<Option<Order>> {
    let order = conn
        .query_row(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
            [id],
            order_from_row,
        )
        .optional()?;
    Ok(order)
}

/// List orders, newest first, optionally only those in one status
pub fn list_orders(conn: &Connection, status: Option<OrderStatus>) -> Result<Vec<Order>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE ?1 IS NULL OR status = ?1 ORDER BY id DESC"
    ))?;
    let rows = stmt.query_map([status.map(OrderStatus::as_str)], order_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Set an order's status. Returns `None` if no such order exists.
pub fn update_order_status(conn: &Connection, id: i64, status: OrderStatus) -> Result<Option<Order>> {
    let changed = conn.execute(
        "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3",
        (status.as_str(), Utc::now(), id),
    )?;
    if changed == 0 {
        return Ok(None);
    }
    get_order(conn, id)
}

const APPLICATION_COLUMNS: &str =
    "id, name, phone, email, address, years_at_address, employer, notes, status, created_at, updated_at";

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<CreditApplication> {
    Ok(CreditApplication {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        address: row.get(4)?,
        years_at_address: row.get(5)?,
        employer: row.get(6)?,
        notes: row.get(7)?,
        status: parse_column(row, 8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Store a validated credit application as pending
pub fn insert_application(conn: &Connection, app: &NewCreditApplication) -> Result<CreditApplication> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO credit_applications (name, phone, email, address, years_at_address, employer, notes, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        (
            &app.name,
            &app.phone,
            &app.email,
            &app.address,
            app.years_at_address,
            &app.employer,
            &app.notes,
            ApplicationStatus::Pending.as_str(),
            now,
        ),
    )?;
    Ok(CreditApplication {
        id: conn.last_insert_rowid(),
        name: app.name.clone(),
        phone: app.phone.clone(),
        email: app.email.clone(),
        address: app.address.clone(),
        years_at_address: app.years_at_address,
        employer: app.employer.clone(),
        notes: app.notes.clone(),
        status: ApplicationStatus::Pending,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_application(conn: &Connection, id: i64) -> Result<Option<CreditApplication>> {
    let app = conn
        .query_row(
            &format!("SELECT {APPLICATION_COLUMNS} FROM credit_applications WHERE id = ?1"),
            [id],
            application_from_row,
        )
        .optional()?;
    Ok(app)
}

/// List credit applications, newest first, optionally only those in one status
pub fn list_applications(
    conn: &Connection,
    status: Option<ApplicationStatus>,
) -> Result<Vec<CreditApplication>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPLICATION_COLUMNS} FROM credit_applications WHERE ?1 IS NULL OR status = ?1 ORDER BY id DESC"
    ))?;
    let rows = stmt.query_map([status.map(ApplicationStatus::as_str)], application_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Set an application's decision. Returns `None` if no such application exists.
pub fn update_application_status(
    conn: &Connection,
    id: i64,
    status: ApplicationStatus,
) -> Result<Option<CreditApplication>> {
    let changed = conn.execute(
        "UPDATE credit_applications SET status = ?1, updated_at = ?2 WHERE id = ?3",
        (status.as_str(), Utc::now(), id),
    )?;
    if changed == 0 {
        return Ok(None);
    }
    get_application(conn, id)
}

/// Record a form completion event.
///
/// Providers retry deliveries, so a repeated (form, submission_id) pair is
/// ignored and `false` is returned.
pub fn record_form_submission(
    conn: &Connection,
    form: &str,
    submission_id: &str,
    email: Option<&str>,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO form_submissions (form, submission_id, email, received_at)
         VALUES (?1, ?2, ?3, ?4)",
        (form, submission_id, email, Utc::now()),
    )?;
    Ok(inserted > 0)
}

pub fn list_form_submissions(conn: &Connection) -> Result<Vec<FormSubmission>> {
    let mut stmt = conn.prepare(
        "SELECT id, form, submission_id, email, received_at FROM form_submissions ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(FormSubmission {
            id: row.get(0)?,
            form: row.get(1)?,
            submission_id: row.get(2)?,
            email: row.get(3)?,
            received_at: row.get(4)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

pub fn counts(conn: &Connection) -> Result<Counts> {
    let counts = conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM leads),
            (SELECT COUNT(*) FROM orders),
            (SELECT COUNT(*) FROM orders WHERE status = 'pending'),
            (SELECT COUNT(*) FROM credit_applications),
            (SELECT COUNT(*) FROM credit_applications WHERE status = 'pending'),
            (SELECT COUNT(*) FROM form_submissions)",
        [],
        |row| {
            Ok(Counts {
                leads: row.get(0)?,
                orders: row.get(1)?,
                pending_orders: row.get(2)?,
                credit_applications: row.get(3)?,
                pending_applications: row.get(4)?,
                form_submissions: row.get(5)?,
            })
        },
    )?;
    Ok(counts)
}

/// Clear all submissions
pub fn clear_submissions(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM form_submissions;
        DELETE FROM credit_applications;
        DELETE FROM orders;
        DELETE FROM leads;
        "#,
    )?;
    Ok(())
}
