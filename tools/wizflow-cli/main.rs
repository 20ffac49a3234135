use clap::{Parser, Subcommand};
use serde_json::Value;
use std::process::ExitCode;
use wizflow::data::FixtureSet;
use wizflow::prelude::*;

/// Run and inspect catalog exploration recipes
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a JSON recipe catalog (defaults to the bundled recipes)
    #[arg(short, long, global = true)]
    catalog: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List recipes, optionally filtered
    List {
        #[arg(short, long)]
        entity_type: Option<EntityType>,
        #[arg(short, long)]
        domain: Option<String>,
    },
    /// Print a recipe definition as JSON
    Show { recipe: String },
    /// Run a recipe offline against captured fixtures
    Run {
        recipe: String,
        /// Fixture file with query templates and captured payloads
        #[arg(short, long)]
        fixtures: String,
        #[arg(short, long, default_value = "UNKNOWN")]
        entity_type: EntityType,
        /// Initial input as key=value; values are parsed as JSON when possible
        #[arg(short, long = "input", value_parser = parse_input)]
        inputs: Vec<(String, Value)>,
        /// Pass missing bindings through as null instead of aborting
        #[arg(long)]
        lenient: bool,
        /// Print the run result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_input(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}

fn load_catalog(path: Option<&str>) -> Result<RecipeCatalog, CatalogError> {
    match path {
        Some(path) => {
            log::info!("Loading recipe catalog from: {}", path);
            RecipeCatalog::from_file(path)
        }
        None => RecipeCatalog::builtin(),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let catalog = match load_catalog(cli.catalog.as_deref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Failed to load recipe catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::List {
            entity_type,
            domain,
        } => {
            list_recipes(&catalog, entity_type, domain.as_deref());
            ExitCode::SUCCESS
        }
        Command::Show { recipe } => match catalog.get(&recipe) {
            Some(recipe) => match serde_json::to_string_pretty(recipe) {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Could not serialize recipe '{}': {}", recipe.id, e);
                    ExitCode::FAILURE
                }
            },
            None => {
                eprintln!("Unknown recipe '{}'", recipe);
                ExitCode::FAILURE
            }
        },
        Command::Run {
            recipe,
            fixtures,
            entity_type,
            inputs,
            lenient,
            json,
        } => {
            let Some(recipe) = catalog.get(&recipe) else {
                eprintln!("Unknown recipe '{}'", recipe);
                return ExitCode::FAILURE;
            };
            let fixtures = match FixtureSet::from_file(&fixtures) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Failed to read fixtures '{}': {}", fixtures, e);
                    return ExitCode::FAILURE;
                }
            };
            run_recipe(recipe, fixtures, entity_type, inputs, lenient, json)
        }
    }
}

fn list_recipes(catalog: &RecipeCatalog, entity_type: Option<EntityType>, domain: Option<&str>) {
    let recipes: Vec<&Recipe> = match (entity_type, domain) {
        (Some(t), Some(d)) => catalog
            .for_entity_type(t)
            .into_iter()
            .filter(|r| r.domain.eq_ignore_ascii_case(d))
            .collect(),
        (Some(t), None) => catalog.for_entity_type(t),
        (None, Some(d)) => catalog.for_domain(d),
        (None, None) => catalog.iter().collect(),
    };

    if recipes.is_empty() {
        println!("No recipes found.");
        return;
    }
    for recipe in recipes {
        let types: Vec<_> = recipe
            .supported_entity_types
            .iter()
            .map(|t| t.as_str())
            .collect();
        println!(
            "{:<20} {:<12} {} steps  [{}]  {}",
            recipe.id,
            recipe.domain,
            recipe.steps.len(),
            types.join(", "),
            recipe.label
        );
    }
}

fn run_recipe(
    recipe: &Recipe,
    fixtures: FixtureSet,
    entity_type: EntityType,
    inputs: Vec<(String, Value)>,
    lenient: bool,
    json: bool,
) -> ExitCode {
    let (resolver, executor) = fixtures.into_collaborators();
    let policy = if lenient {
        BindingPolicy::PassThrough
    } else {
        BindingPolicy::Strict
    };
    let interpreter = FlowInterpreter::builder(resolver, executor)
        .binding_policy(policy)
        .build();

    let entity = Entity::new(entity_type);
    let mut options = RunOptions::new();
    for (key, value) in inputs {
        options = options.input(key, value);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let run = match runtime.block_on(interpreter.run_flow(recipe, &entity, options)) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Run failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&run) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Could not serialize run result: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", RunFormatter::format(&run));
    }

    if run.is_completed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
