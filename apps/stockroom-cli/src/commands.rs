//! CLI commands and their dispatch onto the repository.

use stockroom_core::validation::{parse_id, parse_number, validate_percent, validate_text};
use stockroom_core::{ClassifiedError, CoreResult, Product};
use stockroom_db::ProductRepository;

/// Command-line usage for the trailing command.
pub const COMMANDS_USAGE: &str = "commands: list | get <id> | most-expensive | range <from> <to> | \
     add <id> <good> <price> <category> | raise <category> <percent> | delete <id> | \
     delete-category <category> | truncate  [--json]";

/// A single repository operation requested on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Get(i32),
    MostExpensive,
    Range { from: f64, to: f64 },
    Add(Product),
    Raise { category: String, percent: f64 },
    Delete(i32),
    DeleteCategory(String),
    Truncate,
}

/// Result of running a command, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Products(Vec<Product>),
    Product(Option<Product>),
    Done(String),
}

/// Parsed trailing arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: Command,
    pub json: bool,
}

impl Invocation {
    /// Parses everything after the three startup parameters.
    ///
    /// No command means `list`.
    pub fn parse(rest: Vec<String>) -> CoreResult<Self> {
        let json = rest.iter().any(|a| a == "--json");
        let args: Vec<&str> = rest
            .iter()
            .map(String::as_str)
            .filter(|a| *a != "--json")
            .collect();

        let command = match args.as_slice() {
            [] | ["list"] => Command::List,
            ["get", id] => Command::Get(parse_id(id)?),
            ["most-expensive"] => Command::MostExpensive,
            ["range", from, to] => Command::Range {
                from: parse_number("from", from)?,
                to: parse_number("to", to)?,
            },
            ["add", id, good, price, category] => Command::Add(Product::validated(
                parse_id(id)?,
                *good,
                parse_number("price", price)?,
                *category,
            )?),
            ["raise", category, percent] => {
                validate_text("category", category)?;
                let percent = parse_number("percent", percent)?;
                validate_percent(percent)?;
                Command::Raise {
                    category: category.to_string(),
                    percent,
                }
            }
            ["delete", id] => Command::Delete(parse_id(id)?),
            ["delete-category", category] => Command::DeleteCategory(category.to_string()),
            ["truncate"] => Command::Truncate,
            other => {
                return Err(ClassifiedError::argument(format!(
                    "unknown command '{}'; {}",
                    other.join(" "),
                    COMMANDS_USAGE
                )))
            }
        };

        Ok(Invocation { command, json })
    }
}

impl Command {
    /// Runs the command against the repository.
    pub async fn execute(self, repo: &ProductRepository) -> CoreResult<Outcome> {
        let outcome = match self {
            Command::List => Outcome::Products(repo.get_all().await?),
            Command::Get(id) => Outcome::Product(repo.get_by_id(id).await?),
            Command::MostExpensive => Outcome::Products(repo.get_most_expensive().await?),
            Command::Range { from, to } => {
                Outcome::Products(repo.get_products_with_price_range(from, to).await?)
            }
            Command::Add(product) => {
                repo.create(&product).await?;
                Outcome::Done(format!("Created product {}", product.id))
            }
            Command::Raise { category, percent } => {
                repo.increase_category_price(&category, percent).await?;
                Outcome::Done(format!("Raised prices in '{category}' by factor {percent}"))
            }
            Command::Delete(id) => {
                repo.delete(id).await?;
                Outcome::Done(format!("Deleted product {id}"))
            }
            Command::DeleteCategory(category) => {
                repo.delete_all_category_products(&category).await?;
                Outcome::Done(format!("Deleted products in '{category}'"))
            }
            Command::Truncate => {
                repo.truncate().await?;
                Outcome::Done("Removed all products".to_string())
            }
        };

        Ok(outcome)
    }
}
