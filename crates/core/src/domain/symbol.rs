/// Ticker symbols become file names and URL path segments.
pub fn validate_symbol(symbol: &str) -> anyhow::Result<()> {
    anyhow::ensure!(!symbol.is_empty(), "symbol must be non-empty");
    anyhow::ensure!(
        symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-')),
        "symbol contains unsupported characters: {symbol}"
    );
    anyhow::ensure!(!symbol.contains(".."), "symbol must not contain '..': {symbol}");
    Ok(())
}
