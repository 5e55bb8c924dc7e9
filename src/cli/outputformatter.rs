use terminal_size::{terminal_size, Height, Width};

/// Print rows as an ASCII table fitted to the terminal. Nothing is printed for an empty set
/// except the footer.
pub fn print_table(columns: &[&str], rows: &[Vec<String>]) {
    let termw = get_terminal_width();
    crate::tprintln!("[cli.outputformatter] detected terminal width={} columns", termw);
    for line in render_table(columns, rows, termw, true) {
        println!("{}", line);
    }
}

/// Table lines: separator, header, separator, rows, separator, footer. Every line is at most
/// `termw` visible characters.
pub fn render_table(columns: &[&str], rows: &[Vec<String>], termw: usize, color: bool) -> Vec<String> {
    let mut out = Vec::with_capacity(rows.len() + 5);
    if !rows.is_empty() {
        let mut widths: Vec<usize> = columns.iter().map(|s| visible_len(s).min(termw)).collect();
        for r in rows {
            for (i, cell) in r.iter().enumerate().take(columns.len()) {
                let w = visible_len(cell);
                if w > widths[i] { widths[i] = w.min(termw); }
            }
        }
        let sep = build_separator(&widths);
        out.push(fit_line_to_width(&sep, termw));
        out.push(fit_line_to_width(&build_header(columns, &widths, color), termw));
        out.push(fit_line_to_width(&sep, termw));
        for r in rows {
            out.push(fit_line_to_width(&build_row(r, &widths), termw));
        }
        out.push(fit_line_to_width(&sep, termw));
    }
    out.push(fit_line_to_width(&format!("rows: {}", rows.len()), termw));
    out
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let text = truncate(cell, *w);
        let pad = " ".repeat(w.saturating_sub(visible_len(&text)));
        s.push(' ');
        if is_numeric_like(cell) {
            s.push_str(&pad);
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&pad);
        }
        s.push_str(" |");
    }
    s
}

// Header cells left-aligned, optionally green; padding from visible width.
fn build_header(cells: &[&str], widths: &[usize], color: bool) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let text = truncate(cells.get(i).copied().unwrap_or(""), *w);
        s.push(' ');
        if color {
            s.push_str(&format!("\x1b[32m{}\x1b[0m", text));
        } else {
            s.push_str(&text);
        }
        s.push_str(&" ".repeat(w.saturating_sub(visible_len(&text))));
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

// Amounts like `1.234,50 €`, counts and percentages align right.
fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    let mut has_digit = false;
    for ch in st.chars() {
        if ch.is_ascii_digit() { has_digit = true; continue; }
        if ".,-+% €".contains(ch) { continue; }
        return false;
    }
    has_digit
}

fn get_terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), Height(_))) if w > 20 => (w - 4) as usize,
        _ => 80,
    }
}

fn fit_line_to_width(s: &str, maxw: usize) -> String {
    if visible_len(s) <= maxw { return s.to_string(); }
    elide_middle_preserving_ansi(s, maxw)
}

// Tokens of a line: ANSI CSI sequences (zero width) and runs of visible text.
fn tokenize(s: &str) -> Vec<(bool, &str)> {
    let bytes = s.as_bytes();
    let mut toks = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        if bytes[i] == 0x1B {
            i += 1;
            if i < bytes.len() && bytes[i] == b'[' {
                i += 1;
                while i < bytes.len() {
                    let b = bytes[i];
                    i += 1;
                    if b.is_ascii_alphabetic() { break; }
                }
            }
            toks.push((true, &s[start..i]));
        } else {
            while i < bytes.len() && bytes[i] != 0x1B { i += 1; }
            toks.push((false, &s[start..i]));
        }
    }
    toks
}

fn visible_len(s: &str) -> usize {
    tokenize(s).into_iter().filter(|(ansi, _)| !ansi).map(|(_, t)| t.chars().count()).sum()
}

fn elide_middle_preserving_ansi(s: &str, maxw: usize) -> String {
    if maxw <= 3 { return "…".repeat(maxw.min(1)); }
    let budget = maxw - 3;
    let front_keep = budget / 2;
    let back_keep = budget - front_keep;
    let toks = tokenize(s);

    let mut front = String::new();
    let mut taken = 0usize;
    for (ansi, text) in &toks {
        if *ansi { front.push_str(text); continue; }
        let n = text.chars().count();
        if taken + n <= front_keep {
            front.push_str(text);
            taken += n;
        } else {
            front.extend(text.chars().take(front_keep - taken));
            break;
        }
    }

    let mut back: Vec<String> = Vec::new();
    let mut taken = 0usize;
    for (ansi, text) in toks.iter().rev() {
        if *ansi { back.push(text.to_string()); continue; }
        let n = text.chars().count();
        if taken + n <= back_keep {
            back.push(text.to_string());
            taken += n;
        } else {
            back.push(text.chars().skip(n - (back_keep - taken)).collect());
            break;
        }
    }
    back.reverse();

    // Reset color in case an escape was cut.
    format!("{}...{}\x1b[0m", front, back.concat())
}
