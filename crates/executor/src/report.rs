use std::collections::BTreeSet;

use common::types::ArbitrageCycle;

/// Renders detected cycles, one per line.
pub fn render_cycles(cycles: &[ArbitrageCycle]) -> String {
    if cycles.is_empty() {
        return "No arbitrage opportunities found.\n".to_string();
    }

    let lines: String = cycles.iter().map(|cycle| format!("{}\n", cycle)).collect();
    format!("Arbitrage opportunities ({}):\n{}", cycles.len(), lines)
}

pub fn render_alone(currencies: &BTreeSet<String>) -> String {
    let lines: String = currencies.iter().map(|name| format!("{}\n", name)).collect();
    format!("Alone Currencies:\n{}", lines)
}
