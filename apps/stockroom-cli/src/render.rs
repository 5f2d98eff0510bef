//! Text-table and JSON rendering of command outcomes.

use stockroom_core::Product;

use crate::commands::Outcome;

const HEADERS: [&str; 4] = ["ID", "GOOD", "PRICE", "CATEGORY"];

/// Renders an outcome for stdout.
pub fn render(outcome: &Outcome, json: bool) -> String {
    if json {
        let value = match outcome {
            Outcome::Products(products) => serde_json::json!(sorted(products)),
            Outcome::Product(product) => serde_json::json!(product),
            Outcome::Done(message) => serde_json::json!({ "message": message }),
        };
        // A Value has only string keys
        return serde_json::to_string_pretty(&value).expect("JSON value serializes");
    }

    match outcome {
        Outcome::Products(products) => table(&sorted(products)),
        Outcome::Product(Some(product)) => table(std::slice::from_ref(product)),
        Outcome::Product(None) => "Product not found".to_string(),
        Outcome::Done(message) => message.clone(),
    }
}

fn sorted(products: &[Product]) -> Vec<Product> {
    let mut products = products.to_vec();
    products.sort_by_key(|p| p.id);
    products
}

/// Formats products as an aligned text table.
pub fn table(products: &[Product]) -> String {
    let rows: Vec<[String; 4]> = products
        .iter()
        .map(|p| {
            [
                p.id.to_string(),
                p.good.clone(),
                format!("{:.2}", p.price),
                p.category_name.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out.push_str(&format!("({} rows)", rows.len()));
    out
}

fn push_row(out: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            // ID and PRICE columns are right-aligned
            if i == 0 || i == 2 {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect();
    out.push_str(line.join(" | ").trim_end());
    out.push('\n');
}
