/// 解析巴西格式 (`1.722,47`) 或點號小數 (`1722.47`) 的金額字串
///
/// 有逗號時所有點號都視為千分位；否則直接以點號小數解析。
/// 空字串或無法解析時回傳 `None`，不會當成 0。
pub fn parse_decimal(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let value = if token.contains(',') {
        token.replace('.', "").replace(',', ".").parse::<f64>()
    } else {
        token.parse::<f64>()
    };

    value.ok().filter(|v| v.is_finite())
}

pub fn parse_decimal_opt(token: Option<&str>) -> Option<f64> {
    token.and_then(parse_decimal)
}

/// 四捨六入五成雙到小數兩位
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
