//! Regex-based extraction of `<table>` contents from MirGeneDB pages.

use std::sync::LazyLock;

use regex::Regex;

static TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table\s*>").expect("table pattern"));
static THEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<thead\b[^>]*>(.*?)</thead\s*>").expect("thead pattern"));
static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>").expect("row pattern"));
static CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(td|th)\b([^>]*)>(.*?)</(?:td|th)\s*>").expect("cell pattern")
});
static COLSPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)colspan\s*=\s*["']?(\d+)"#).expect("colspan pattern")
});
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*["']([^"']*)["']"#).expect("href pattern")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern"));
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("space pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlCell {
    pub text: String,
    pub href: Option<String>,
    pub header: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlTable {
    pub header_rows: Vec<Vec<HtmlCell>>,
    pub body_rows: Vec<Vec<HtmlCell>>,
}

impl HtmlTable {
    /// Column names taken from the last header row.
    pub fn column_names(&self) -> Vec<&str> {
        self.header_rows
            .last()
            .map(|row| row.iter().map(|cell| cell.text.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.column_names().iter().position(|name| *name == label)
    }
}

pub fn extract_tables(html: &str) -> Vec<HtmlTable> {
    TABLE_RE
        .captures_iter(html)
        .map(|caps| parse_table(&caps[1]))
        .collect()
}

fn parse_table(inner: &str) -> HtmlTable {
    if let Some(thead) = THEAD_RE.captures(inner) {
        let header_rows = parse_rows(&thead[1]);
        let rest = THEAD_RE.replace(inner, "");
        return HtmlTable {
            header_rows,
            body_rows: parse_rows(&rest),
        };
    }

    let mut table = HtmlTable::default();
    for row in parse_rows(inner) {
        let all_header = !row.is_empty() && row.iter().all(|cell| cell.header);
        if all_header && table.body_rows.is_empty() {
            table.header_rows.push(row);
        } else {
            table.body_rows.push(row);
        }
    }
    table
}

fn parse_rows(html: &str) -> Vec<Vec<HtmlCell>> {
    ROW_RE
        .captures_iter(html)
        .map(|row| parse_cells(&row[1]))
        .filter(|cells| !cells.is_empty())
        .collect()
}

fn parse_cells(row: &str) -> Vec<HtmlCell> {
    let mut cells = Vec::new();
    for caps in CELL_RE.captures_iter(row) {
        let header = caps[1].eq_ignore_ascii_case("th");
        let span = COLSPAN_RE
            .captures(&caps[2])
            .and_then(|span| span[1].parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        let content = &caps[3];
        let cell = HtmlCell {
            text: cell_text(content),
            href: HREF_RE
                .captures(content)
                .map(|href| decode_entities(href[1].trim())),
            header,
        };
        for _ in 1..span {
            cells.push(cell.clone());
        }
        cells.push(cell);
    }
    cells
}

fn cell_text(content: &str) -> String {
    let stripped = TAG_RE.replace_all(content, " ");
    let decoded = decode_entities(&stripped);
    SPACE_RE.replace_all(decoded.trim(), " ").into_owned()
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &tail[1..end];
            decode_entity(entity).map(|ch| (ch, end + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}
