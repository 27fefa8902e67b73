//! Prompt templates for company extraction and the performance summary

use crate::error::Result;
use minijinja::{Environment, context};

const EXTRACTION_TEMPLATE: &str = "\
I have the following document:

{{ query }}

Please analyze this text and match it against the following company names:
{{ names | join(\", \") }}.

Return high-confidence matches along with their descriptions if available. \
Also look out for abbreviated forms and focus more on fuzzy string matching. \
Give the output as a JSON object with a \"matches\" array, where every element \
has a \"description\" field holding the company name as it appears in the list above.
";

const SUMMARY_TEMPLATE: &str = "\
Analyze the following weekly stock returns and provide a summary of performance:

Average Weekly Returns (%):
{{ rankings }}

Provide insights about:
1. Ranking of stocks by performance
2. Notable trends or patterns
3. Best and worst performing stocks
";

/// User message asking the model to pick listed companies out of `query`
pub fn extraction_prompt(query: &str, names: &[&str]) -> Result<String> {
    let env = Environment::new();
    Ok(env.render_str(EXTRACTION_TEMPLATE, context! { query => query, names => names })?)
}

/// User message asking the model to comment on a rendered ranking table
pub fn summary_prompt(rankings_table: &str) -> Result<String> {
    let env = Environment::new();
    Ok(env.render_str(SUMMARY_TEMPLATE, context! { rankings => rankings_table })?)
}
