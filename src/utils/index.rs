/// Format a decimal amount string with a currency symbol and thousands separators.
///
/// Unparseable input is returned unchanged after the symbol.
pub fn format_amount(amount: &str, symbol: &str) -> String {
	let Ok(value) = amount.trim().parse::<f64>() else {
		return format!("{}{}", symbol, amount);
	};

	let sign = if value < 0.0 { "-" } else { "" };
	let fixed = format!("{:.2}", value.abs());
	let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

	let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
	for (i, digit) in whole.chars().enumerate() {
		if i > 0 && (whole.len() - i) % 3 == 0 {
			grouped.push(',');
		}
		grouped.push(digit);
	}

	format!("{}{}{}.{}", sign, symbol, grouped, fraction)
}
