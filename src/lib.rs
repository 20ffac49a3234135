//! # wizflow - Multi-step Recipe Execution Engine
//!
//! **wizflow** drives the "wizard" flows of a catalog exploration tool. A wizard is a
//! [`Recipe`](recipe::Recipe): an ordered list of query-backed steps. The engine walks
//! the steps in order, resolves each step's inputs from a shared context, hands the
//! resulting SQL to a backend, extracts typed values from the tabular result and feeds
//! them to the next step. The last step usually composes the query the user actually
//! wants.
//!
//! ## Core Workflow
//!
//! 1.  **Load a catalog**: build a [`RecipeCatalog`](catalog::RecipeCatalog) once at startup,
//!     from the bundled recipes, a JSON file, or recipes built in code.
//! 2.  **Plug in the backend**: implement [`QueryResolver`](query::QueryResolver) (query id +
//!     inputs to SQL) and [`QueryExecutor`](query::QueryExecutor) (SQL to a tabular payload).
//! 3.  **Run**: create a [`FlowInterpreter`](interpreter::FlowInterpreter) and call
//!     `run_flow` for an entity. The returned trace records every step.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wizflow::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let recipe = Recipe::builder("list_tables")
//!         .supports(EntityType::Schema)
//!         .step(
//!             Step::new("discover", StepKind::Discover, "list_tables")
//!                 .bind("schema", "schema")
//!                 .output("tables", ExtractionSpec::unique("TABLE_NAME")),
//!         )
//!         .step(
//!             Step::new("build", StepKind::BuildFinal, "select_tables")
//!                 .bind("tables", "tables"),
//!         )
//!         .build()?;
//!
//!     let resolver = TemplateResolver::new()
//!         .with_template("list_tables", "SHOW TABLES IN {{schema}}")
//!         .with_template("select_tables", "SELECT * FROM INFO WHERE NAME IN ({{tables}})");
//!     let executor = ReplayExecutor::default().with_fixture(
//!         "SHOW TABLES",
//!         json!({ "columns": ["TABLE_NAME"], "rows": [["ORDERS"], ["CUSTOMERS"]] }),
//!     );
//!
//!     let interpreter = FlowInterpreter::new(resolver, executor);
//!     let entity = Entity::new(EntityType::Schema).with_attribute("schema", "SALES");
//!
//!     let run = tokio_test::block_on(interpreter.run_flow(&recipe, &entity, RunOptions::new()))?;
//!     println!("{}", RunFormatter::format(&run));
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod context;
pub mod data;
pub mod error;
pub mod extraction;
pub mod interpreter;
pub mod prelude;
pub mod query;
pub mod recipe;
pub mod trace;
