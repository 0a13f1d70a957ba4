//! Synthetic bank-marketing data generator
//!
//! Writes a `customer.parquet`/`campaign.parquet` pair shaped like the real
//! inputs. Output is deterministic for a given seed. Not every customer was
//! called and some calls reference unknown customers, so the inner join
//! drops rows on both sides. A small share of outcomes is neither "yes"
//! nor "no".

use arrow::array::{Int64Array, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rand::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::{CAMPAIGN_FILE, CUSTOMER_FILE};
use crate::error::Result;

const JOBS: &[&str] = &[
    "admin.",
    "blue-collar",
    "entrepreneur",
    "housemaid",
    "management",
    "retired",
    "self-employed",
    "services",
    "student",
    "technician",
    "unemployed",
];
const MARITAL: &[&str] = &["married", "single", "divorced"];
const EDUCATION: &[&str] = &["primary", "secondary", "tertiary", "unknown"];
const CONTACT: &[&str] = &["cellular", "telephone", "unknown"];
const MONTHS: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

pub fn customer_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("customer_id", DataType::Int64, false),
        Field::new("age", DataType::Int64, false),
        Field::new("job", DataType::Utf8, false),
        Field::new("marital", DataType::Utf8, false),
        Field::new("education", DataType::Utf8, false),
        Field::new("balance", DataType::Int64, false),
        Field::new("housing", DataType::Int64, false),
        Field::new("loan", DataType::Int64, false),
        Field::new("has_loan_or_housing", DataType::Int64, false),
    ]))
}

pub fn campaign_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("customer_id", DataType::Int64, false),
        Field::new("contact", DataType::Utf8, false),
        Field::new("month", DataType::Utf8, false),
        Field::new("duration", DataType::Int64, false),
        Field::new("campaign", DataType::Int64, false),
        Field::new("deposit", DataType::Utf8, true),
    ]))
}

/// Bank-marketing data generator
pub struct SampleGenerator {
    customers: usize,
    rng: StdRng,
}

impl SampleGenerator {
    pub fn new(customers: usize) -> Self {
        Self {
            customers,
            rng: StdRng::seed_from_u64(42),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Generate both tables and write them into `output_dir`
    pub fn write_to(&mut self, output_dir: &Path) -> Result<()> {
        fs::create_dir_all(output_dir)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let customer = self.generate_customer()?;
        let campaign = self.generate_campaign()?;

        write_parquet_file(&output_dir.join(CUSTOMER_FILE), &customer, &props)?;
        write_parquet_file(&output_dir.join(CAMPAIGN_FILE), &campaign, &props)?;
        Ok(())
    }

    pub fn generate_customer(&mut self) -> Result<RecordBatch> {
        let count = self.customers;
        let mut ids = Vec::with_capacity(count);
        let mut ages = Vec::with_capacity(count);
        let mut jobs = StringBuilder::new();
        let mut marital = StringBuilder::new();
        let mut education = StringBuilder::new();
        let mut balances = Vec::with_capacity(count);
        let mut housing = Vec::with_capacity(count);
        let mut loans = Vec::with_capacity(count);
        let mut either = Vec::with_capacity(count);

        for i in 0..count {
            let job = JOBS[self.rng.gen_range(0..JOBS.len())];
            let age = match job {
                "student" => self.rng.gen_range(18..30),
                "retired" => self.rng.gen_range(55..95),
                _ => self.rng.gen_range(21..65),
            };
            let has_housing = self.rng.gen_bool(0.55) as i64;
            let has_loan = self.rng.gen_bool(0.15) as i64;

            ids.push((i + 1) as i64);
            ages.push(age);
            jobs.append_value(job);
            marital.append_value(MARITAL[self.rng.gen_range(0..MARITAL.len())]);
            education.append_value(EDUCATION[self.rng.gen_range(0..EDUCATION.len())]);
            balances.push(self.rng.gen_range(-2_000..40_000));
            housing.push(has_housing);
            loans.push(has_loan);
            either.push(has_housing | has_loan);
        }

        let batch = RecordBatch::try_new(
            customer_schema(),
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(Int64Array::from(ages)),
                Arc::new(jobs.finish()),
                Arc::new(marital.finish()),
                Arc::new(education.finish()),
                Arc::new(Int64Array::from(balances)),
                Arc::new(Int64Array::from(housing)),
                Arc::new(Int64Array::from(loans)),
                Arc::new(Int64Array::from(either)),
            ],
        )?;
        Ok(batch)
    }

    pub fn generate_campaign(&mut self) -> Result<RecordBatch> {
        // ~90% of customers were called, plus a few calls to unknown ids
        let orphans = (self.customers / 20).max(1);
        let mut ids = Vec::new();
        for id in 1..=self.customers as i64 {
            if self.rng.gen_bool(0.9) {
                ids.push(id);
            }
        }
        for i in 0..orphans {
            ids.push((self.customers + 1 + i) as i64);
        }
        ids.shuffle(&mut self.rng);

        let mut contact = StringBuilder::new();
        let mut month = StringBuilder::new();
        let mut durations = Vec::with_capacity(ids.len());
        let mut contacts = Vec::with_capacity(ids.len());
        let mut deposit = StringBuilder::new();

        for _ in &ids {
            let duration: i64 = self.rng.gen_range(5..1_800);
            // longer calls convert more often
            let p_yes = (0.05 + duration as f64 / 2_500.0).min(0.9);

            contact.append_value(CONTACT[self.rng.gen_range(0..CONTACT.len())]);
            month.append_value(MONTHS[self.rng.gen_range(0..MONTHS.len())]);
            durations.push(duration);
            contacts.push(self.rng.gen_range(1..10));

            if self.rng.gen_bool(0.01) {
                deposit.append_value("unknown");
            } else if self.rng.gen_bool(p_yes) {
                deposit.append_value("yes");
            } else {
                deposit.append_value("no");
            }
        }

        let batch = RecordBatch::try_new(
            campaign_schema(),
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(contact.finish()),
                Arc::new(month.finish()),
                Arc::new(Int64Array::from(durations)),
                Arc::new(Int64Array::from(contacts)),
                Arc::new(deposit.finish()),
            ],
        )?;
        Ok(batch)
    }
}

fn write_parquet_file(path: &Path, batch: &RecordBatch, props: &WriterProperties) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props.clone()))?;
    writer.write(batch)?;
    writer.close()?;

    info!(
        path = %path.display(),
        rows = batch.num_rows(),
        bytes = fs::metadata(path)?.len(),
        "Wrote sample table"
    );
    Ok(())
}
