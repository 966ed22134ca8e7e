use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pmstream_frame::{ByteOrder, Checksum, SensorVariant};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct VariantOutput {
    name: &'static str,
    header: String,
    length: usize,
    tail: Option<String>,
    byte_order: &'static str,
    checksum: &'static str,
    data_words: usize,
}

impl VariantOutput {
    fn new(variant: SensorVariant) -> Self {
        let spec = variant.spec();
        Self {
            name: spec.name,
            header: hex_bytes(spec.header),
            length: spec.length,
            tail: spec.tail.map(|tail| format!("{tail:02x}")),
            byte_order: match spec.byte_order {
                ByteOrder::BigEndian => "big-endian",
                ByteOrder::LittleEndian => "little-endian",
            },
            checksum: match spec.checksum {
                Checksum::Sum16 => "sum16",
                Checksum::Sum8 => "sum8",
            },
            data_words: spec.data_words,
        }
    }
}

/// Render the supported sensor families.
pub fn render_variants(format: OutputFormat) -> String {
    let rows: Vec<VariantOutput> = SensorVariant::ALL
        .into_iter()
        .map(VariantOutput::new)
        .collect();

    match format {
        OutputFormat::Json => {
            serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "SENSOR", "HEADER", "LENGTH", "TAIL", "WORDS", "ORDER", "CHECKSUM",
                ]);
            for row in &rows {
                table.add_row(vec![
                    row.name.to_string(),
                    row.header.clone(),
                    row.length.to_string(),
                    row.tail.clone().unwrap_or_else(|| "-".to_string()),
                    row.data_words.to_string(),
                    row.byte_order.to_string(),
                    row.checksum.to_string(),
                ]);
            }
            table.to_string()
        }
        OutputFormat::Pretty => rows
            .iter()
            .map(|row| {
                format!(
                    "{} header={} length={} words={} order={} checksum={}",
                    row.name, row.header, row.length, row.data_words, row.byte_order, row.checksum
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_lists_every_variant() {
        let out = render_variants(OutputFormat::Json);
        let rows: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(rows.len(), SensorVariant::ALL.len());
        assert_eq!(rows[0]["name"], "PMSx003");
        assert_eq!(rows[0]["header"], "42 4d 00 1c");
        assert_eq!(rows[3]["tail"], "ab");
        assert!(rows[0]["tail"].is_null());
    }

    #[test]
    fn pretty_has_one_line_per_variant() {
        let out = render_variants(OutputFormat::Pretty);
        assert_eq!(out.lines().count(), 4);
        assert!(out.contains("SDS01x header=aa c0 length=10"));
    }

    #[test]
    fn table_names_every_variant() {
        let out = render_variants(OutputFormat::Table);
        for variant in SensorVariant::ALL {
            assert!(out.contains(variant.name()), "{out}");
        }
    }
}
