//! Input masks and display formatting.
//!
//! Masks behave like the ones applied to form inputs while typing: the
//! input is reduced to digits, truncated to the field's length, and the
//! separators for the digits present so far are inserted. Because the
//! first step discards everything but digits, masking already-masked text
//! is a no-op.

/// Keep ASCII digits only.
pub fn only_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Apply `pattern` to `digits`, where `#` consumes one digit and any other
/// character is a separator emitted only when more digits follow.
fn apply_pattern(digits: &str, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut iter = digits.chars().peekable();
    for slot in pattern.chars() {
        if iter.peek().is_none() {
            break;
        }
        if slot == '#' {
            if let Some(d) = iter.next() {
                out.push(d);
            }
        } else {
            out.push(slot);
        }
    }
    out
}

fn truncated(input: &str, max: usize) -> String {
    only_digits(input).chars().take(max).collect()
}

/// `000.000.000-00`
pub fn mask_cpf(input: &str) -> String {
    apply_pattern(&truncated(input, 11), "###.###.###-##")
}

/// `00.000.000/0000-00`
pub fn mask_cnpj(input: &str) -> String {
    apply_pattern(&truncated(input, 14), "##.###.###/####-##")
}

/// `00000-000`
pub fn mask_cep(input: &str) -> String {
    apply_pattern(&truncated(input, 8), "#####-###")
}

/// `(00) 0000-0000` for landlines, `(00) 00000-0000` once an eleventh
/// digit is typed.
pub fn mask_phone(input: &str) -> String {
    let digits = truncated(input, 11);
    if digits.len() > 10 {
        apply_pattern(&digits, "(##) #####-####")
    } else {
        apply_pattern(&digits, "(##) ####-####")
    }
}

/// Format cents as Brazilian reais: `R$ 1.234,56`.
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let reais = (abs / 100).to_string();
    let centavos = abs % 100;

    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (i, c) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("{sign}R$ {grouped},{centavos:02}")
}
