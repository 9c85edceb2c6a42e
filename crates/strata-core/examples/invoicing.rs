//! Invoicing System - Schema Declaration Example
//!
//! This example demonstrates:
//! - Declaring tables with `#[derive(Table)]`
//! - Foreign keys, unique columns and database-level indexes
//! - Building parameterized queries from the generated columns
//! - The JSON snapshot that migrations persist
//!
//! Run with: cargo run --example invoicing

use strata_core::schema::{Index, IndexType, Schema};
use strata_core::sql::comp::and_;
use strata_core::sql::query::{Insert, Select, Update};
use strata_core::sql::{Block, Comparable};
use strata_derive::Table;

// =============================================================================
// SCHEMA DEFINITIONS
// =============================================================================

/// Company - the tenant in a multi-tenant invoicing system.
#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
#[table(name = "companies")]
pub struct Company {
    #[column(primary_key, sql_type = "SERIAL")]
    pub id: i32,
    pub name: String,
    pub tax_id: Option<String>,
    #[column(sql_type = "CHAR(3)", default = "'EUR'")]
    pub default_currency: String,
}

/// Client - customers who receive invoices.
#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
#[table(name = "clients")]
pub struct Client {
    #[column(primary_key, sql_type = "SERIAL")]
    pub id: i32,
    #[column(references = "companies(id)")]
    pub company_id: i32,
    pub name: String,
    #[column(unique)]
    pub email: Option<String>,
    pub payment_terms_days: Option<i16>,
}

/// Invoice - the main billing document.
#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
#[table(name = "invoices")]
pub struct Invoice {
    #[column(primary_key, sql_type = "SERIAL")]
    pub id: i32,
    #[column(references = "companies(id)")]
    pub company_id: i32,
    #[column(references = "clients(id)")]
    pub client_id: i32,
    #[column(unique)]
    pub invoice_number: String,
    #[column(default = "'draft'")]
    pub status: String,
    pub total_cents: i64,
    #[column(sql_type = "DATE")]
    pub due_date: String,
    #[column(sql_type = "TIMESTAMPTZ")]
    pub paid_at: Option<String>,
}

// =============================================================================
// HELPER TO PRINT SQL
// =============================================================================

fn print_sql(description: &str, block: &Block) {
    let (sql, params) = block.render();
    println!("-- {description}");
    println!("{sql};");
    println!("-- params: {params:?}");
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let schema = Schema::builder()
        .table_of::<CompanyTable>()
        .table_of::<ClientTable>()
        .table_of::<InvoiceTable>()
        .index(Index::new(
            "invoices",
            &["company_id", "due_date"],
            IndexType::Btree,
            false,
        )?)
        .build()?;

    let company_id = 1_i32;
    let today = "2024-01-15";

    // Overdue invoices
    let overdue = Select::from_table(InvoiceTable::table_name())
        .fields([Invoice::id(), Invoice::invoice_number(), Invoice::total_cents()])
        .where_clause(and_([
            Invoice::company_id().eq(company_id),
            Invoice::status().eq("sent"),
            Invoice::due_date().lt(today),
        ]))
        .order_by(Invoice::due_date())
        .build();
    print_sql("Overdue invoices", &overdue);

    // Unpaid total per company
    let unpaid = Select::from_table(InvoiceTable::table_name())
        .count()
        .where_clause(and_([
            Invoice::company_id().eq(company_id),
            Invoice::paid_at().is_null(),
        ]))
        .build();
    print_sql("Number of unpaid invoices", &unpaid);

    // New client
    let insert = Insert::into_table(ClientTable::table_name())
        .value(&Client::company_id(), company_id)
        .value(&Client::name(), "Acme Corp")
        .value(&Client::email(), Some("billing@acme.test"))
        .returning([Client::id()])
        .build();
    print_sql("Create client", &insert);

    // Mark as paid
    let paid = Update::table(InvoiceTable::table_name())
        .set(&Invoice::status(), "paid")
        .set(&Invoice::paid_at(), today)
        .where_clause(Invoice::id().eq(42))
        .build();
    print_sql("Mark invoice as paid", &paid);

    println!("-- Schema snapshot");
    println!("{}", serde_json::to_string_pretty(&schema.describe())?);

    Ok(())
}
