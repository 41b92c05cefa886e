//! Parser for Tesseract's TSV output.
//!
//! Columns: level, page_num, block_num, par_num, line_num, word_num, left,
//! top, width, height, conf, text. Only word rows (level 5) carry text.

use serde::{Deserialize, Serialize};

const WORD_LEVEL: u32 = 5;

/// One recognized word with its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsvWord {
    pub block: u32,
    pub paragraph: u32,
    pub line: u32,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// Confidence 0-100 as reported by the engine.
    pub confidence: f32,
    pub text: String,
}

/// Words grouped into lines and blocks, in reading order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TsvLayout {
    pub blocks: Vec<String>,
    pub lines: Vec<String>,
    pub words: Vec<TsvWord>,
}

impl TsvLayout {
    /// Full text: lines joined by newlines, blocks separated by a blank line.
    pub fn text(&self) -> String {
        self.blocks.join("\n\n")
    }

    /// Mean word confidence scaled to 0.0 - 1.0.
    pub fn mean_confidence(&self) -> Option<f32> {
        if self.words.is_empty() {
            return None;
        }
        let sum: f32 = self.words.iter().map(|w| w.confidence).sum();
        Some((sum / self.words.len() as f32 / 100.0).clamp(0.0, 1.0))
    }
}

/// Parse TSV text into word rows. Malformed rows are skipped.
pub fn parse_words(tsv: &str) -> Vec<TsvWord> {
    tsv.lines()
        .filter_map(|row| {
            let cols: Vec<&str> = row.split('\t').collect();
            if cols.len() < 12 {
                return None;
            }
            let num = |i: usize| cols[i].trim().parse::<u32>().ok();

            if num(0)? != WORD_LEVEL {
                return None;
            }
            let confidence = cols[10].trim().parse::<f32>().ok()?;
            let text = cols[11..].join("\t").trim().to_string();
            if confidence < 0.0 || text.is_empty() {
                return None;
            }

            Some(TsvWord {
                block: num(2)?,
                paragraph: num(3)?,
                line: num(4)?,
                left: num(6)?,
                top: num(7)?,
                width: num(8)?,
                height: num(9)?,
                confidence,
                text,
            })
        })
        .collect()
}

/// Group parsed words into lines and blocks.
pub fn layout(words: Vec<TsvWord>) -> TsvLayout {
    let mut blocks: Vec<Vec<String>> = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    let mut current_block: Option<u32> = None;
    let mut current_line: Option<(u32, u32, u32)> = None;

    for word in &words {
        let line_key = (word.block, word.paragraph, word.line);

        if current_line != Some(line_key) {
            lines.push(String::new());
            current_line = Some(line_key);

            if current_block != Some(word.block) {
                blocks.push(Vec::new());
                current_block = Some(word.block);
            }
            if let Some(block) = blocks.last_mut() {
                block.push(String::new());
            }
        }

        if let Some(line) = lines.last_mut() {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word.text);
        }
        if let Some(block_line) = blocks.last_mut().and_then(|b| b.last_mut()) {
            if !block_line.is_empty() {
                block_line.push(' ');
            }
            block_line.push_str(&word.text);
        }
    }

    TsvLayout {
        blocks: blocks.into_iter().map(|b| b.join("\n")).collect(),
        lines,
        words,
    }
}
