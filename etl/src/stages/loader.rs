//! Load stage: project the transformed dataset into tables and replace them
//! in the database.
//!
//! Tables load in the fixed order `products`, `categories`, `orders`. No
//! foreign keys are declared and no cross-table checks are made.

use crate::config::PipelineConfig;
use crate::error::{StageError, StageResult};
use crate::logs::log_info;
use crate::models::{columns, Dataset};
use crate::parser::read_dataset;
use crate::report::{LoadReport, StageReport};
use crate::store::{Store, Table};

use super::{Stage, StageName};

/// Shape of one projected table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    /// Natural key; the first row of each key is kept.
    pub key: &'static [&'static str],
}

impl TableSpec {
    pub fn project(&self, dataset: &Dataset) -> StageResult<Table> {
        let mut data = dataset.select(self.columns)?;
        data.dedup_by(self.key)?;
        Ok(Table {
            name: self.name.to_string(),
            data,
        })
    }
}

pub const PRODUCTS: TableSpec = TableSpec {
    name: "products",
    columns: &[columns::PRODUCT_ID, columns::CATEGORY_ID, columns::BRAND, columns::PRICE],
    key: &[columns::PRODUCT_ID],
};

pub const CATEGORIES: TableSpec = TableSpec {
    name: "categories",
    columns: &[columns::CATEGORY_ID, columns::CATEGORY],
    key: &[columns::CATEGORY_ID, columns::CATEGORY],
};

pub const ORDERS: TableSpec = TableSpec {
    name: "orders",
    columns: &[
        columns::ORDER_ID,
        columns::PRODUCT_ID,
        columns::USER_ID,
        columns::EVENT_TIME,
        columns::PRICE,
    ],
    key: &[columns::ORDER_ID],
};

pub const LOAD_ORDER: [TableSpec; 3] = [PRODUCTS, CATEGORIES, ORDERS];

/// Every column any projection needs, in first-use order.
pub fn required_columns() -> Vec<&'static str> {
    let mut required: Vec<&'static str> = Vec::new();
    for &column in LOAD_ORDER.iter().flat_map(|spec| spec.columns.iter()) {
        if !required.contains(&column) {
            required.push(column);
        }
    }
    required
}

/// Project the dataset into the tables in [`LOAD_ORDER`].
pub fn project(dataset: &Dataset) -> StageResult<Vec<Table>> {
    dataset.require_columns(&required_columns())?;
    LOAD_ORDER.iter().map(|spec| spec.project(dataset)).collect()
}

/// Reads `transformed_path`, replaces the tables at `database_url`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Loader;

impl Stage for Loader {
    fn name(&self) -> StageName {
        StageName::Load
    }

    fn run(&self, config: &PipelineConfig) -> StageResult<StageReport> {
        if !config.transformed_path.exists() {
            return Err(StageError::MissingSource {
                path: config.transformed_path.clone(),
                hint: "Run the transform stage first.".to_string(),
            });
        }

        log_info(format!("Loading transformed data from {}", config.transformed_path.display()));
        let parsed = read_dataset(&config.transformed_path)
            .map_err(|e| StageError::from(e).with_hint("Run the transform stage first."))?;
        log_info(format!("Available columns: {}", parsed.dataset.headers.join(", ")));

        let tables = project(&parsed.dataset)?;

        let mut store = Store::open(&config.database_url)?;
        let loaded = store.replace_tables(&tables, config.chunk_size)?;

        Ok(StageReport::Load(LoadReport {
            database: store.url().to_string(),
            tables: loaded,
        }))
    }
}
