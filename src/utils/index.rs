/// Renders a base-unit amount as a decimal string with `decimals` fractional digits.
pub fn format_token_amount(amount: u64, decimals: u32) -> String {
	let divisor = 10u64.pow(decimals);
	format!(
		"{}.{:0width$}",
		amount / divisor,
		amount % divisor,
		width = decimals as usize
	)
}
