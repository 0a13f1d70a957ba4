//! Customer/campaign join and outcome normalization

use crate::config::DashboardConfig;
use crate::data::columns::{as_utf8, column};
use crate::data::loader::{load_table, Table};
use crate::error::Result;
use arrow::array::{ArrayRef, Int64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Shared customer identifier
pub const KEY_COLUMN: &str = "customer_id";
/// Textual outcome column in the campaign table, binary in the joined table
pub const OUTCOME_COLUMN: &str = "deposit";
pub const POSITIVE_OUTCOME: &str = "yes";
pub const NEGATIVE_OUTCOME: &str = "no";
/// Suffix for campaign columns whose name is already used by a customer column
pub const COLLISION_SUFFIX: &str = "_campaign";

/// Map the textual outcome to its binary indicator
///
/// Anything other than the two known categories is absent.
pub fn map_outcome(value: Option<&str>) -> Option<i64> {
    match value {
        Some(POSITIVE_OUTCOME) => Some(1),
        Some(NEGATIVE_OUTCOME) => Some(0),
        _ => None,
    }
}

/// The two source tables and their inner join, built once per session
#[derive(Debug, Clone)]
pub struct Dataset {
    customer: Table,
    campaign: Table,
    joined: Table,
    outcome: String,
}

impl Dataset {
    /// Load both input files and join them
    pub async fn load(config: &DashboardConfig) -> Result<Self> {
        let customer = load_table("customer", &config.customer_path)?;
        let campaign = load_table("campaign", &config.campaign_path)?;
        Self::from_tables(customer, campaign).await
    }

    /// Join two already loaded tables
    pub async fn from_tables(customer: Table, campaign: Table) -> Result<Self> {
        customer.require_column(KEY_COLUMN)?;
        campaign.require_column(KEY_COLUMN)?;
        campaign.require_column(OUTCOME_COLUMN)?;

        let start = Instant::now();
        let (joined, outcome) = join_tables(&customer, &campaign).await?;
        info!(
            customer_rows = customer.num_rows(),
            campaign_rows = campaign.num_rows(),
            joined_rows = joined.num_rows(),
            elapsed = ?start.elapsed(),
            "Joined customer and campaign tables"
        );

        Ok(Self {
            customer,
            campaign,
            joined,
            outcome,
        })
    }

    pub fn customer(&self) -> &Table {
        &self.customer
    }

    pub fn campaign(&self) -> &Table {
        &self.campaign
    }

    pub fn joined(&self) -> &Table {
        &self.joined
    }

    /// Name of the binary outcome column in the joined table
    pub fn outcome_column(&self) -> &str {
        &self.outcome
    }
}

async fn join_tables(customer: &Table, campaign: &Table) -> Result<(Table, String)> {
    let ctx = SessionContext::new();
    register_memory(&ctx, customer)?;
    register_memory(&ctx, campaign)?;

    let (sql, outcome_alias) = join_sql(&customer.schema(), &campaign.schema());
    debug!(%sql, "Join query");

    let df = ctx.sql(&sql).await?;
    let raw_schema: SchemaRef = Arc::new(Schema::from(df.schema()));
    let raw = df.collect().await?;

    let schema = outcome_schema(&raw_schema, &outcome_alias)?;
    let batches = raw
        .iter()
        .map(|batch| map_outcome_batch(batch, schema.clone(), &outcome_alias))
        .collect::<Result<Vec<_>>>()?;

    Ok((Table::new("joined", schema, batches), outcome_alias))
}

fn register_memory(ctx: &SessionContext, table: &Table) -> Result<()> {
    let mem = MemTable::try_new(table.schema(), vec![table.batches().to_vec()])?;
    ctx.register_table(table.name(), Arc::new(mem))?;
    Ok(())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Build the join statement and return it with the outcome column's alias
///
/// The key appears once. Customer columns come first, then the remaining
/// campaign columns in file order; the outcome is selected as text and
/// converted afterwards.
fn join_sql(customer: &Schema, campaign: &Schema) -> (String, String) {
    let customer_names: HashSet<&str> = customer
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect();

    let mut select: Vec<String> = customer
        .fields()
        .iter()
        .map(|f| format!("c.{}", quote_ident(f.name())))
        .collect();

    let mut outcome_alias = OUTCOME_COLUMN.to_string();
    for field in campaign.fields() {
        let name = field.name().as_str();
        if name == KEY_COLUMN {
            continue;
        }
        let alias = if customer_names.contains(name) {
            format!("{name}{COLLISION_SUFFIX}")
        } else {
            name.to_string()
        };

        if name == OUTCOME_COLUMN {
            select.push(format!(
                "CAST(k.{} AS VARCHAR) AS {}",
                quote_ident(name),
                quote_ident(&alias)
            ));
            outcome_alias = alias;
        } else {
            select.push(format!("k.{} AS {}", quote_ident(name), quote_ident(&alias)));
        }
    }

    let key = quote_ident(KEY_COLUMN);
    let sql = format!(
        "SELECT {} FROM customer c INNER JOIN campaign k ON c.{key} = k.{key} ORDER BY c.{key}",
        select.join(", ")
    );
    (sql, outcome_alias)
}

fn outcome_schema(raw: &Schema, outcome: &str) -> Result<SchemaRef> {
    let idx = raw.index_of(outcome)?;
    let fields: Vec<Field> = raw
        .fields()
        .iter()
        .enumerate()
        .map(|(i, f)| {
            if i == idx {
                Field::new(outcome, DataType::Int64, true)
            } else {
                f.as_ref().clone()
            }
        })
        .collect();
    Ok(Arc::new(Schema::new(fields)))
}

fn map_outcome_batch(batch: &RecordBatch, schema: SchemaRef, outcome: &str) -> Result<RecordBatch> {
    let idx = batch.schema().index_of(outcome)?;
    let text = as_utf8(column(batch, "joined", outcome)?.as_ref())?;
    let mapped: Int64Array = text.iter().map(map_outcome).collect();

    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    columns[idx] = Arc::new(mapped);
    Ok(RecordBatch::try_new(schema, columns)?)
}
