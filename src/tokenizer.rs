use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// A quote closes a string only when it follows a non-backslash character
    /// and an even number of backslashes.
    static ref CLOSING_DOUBLE_QUOTE: Regex = Regex::new(r#"[^\\](?:\\\\)*""#).unwrap();
}

/// Incremental splitter for a stream of brace-delimited values
///
/// Text is pushed in arbitrarily sized chunks. Whenever the brace balance
/// returns to zero, everything buffered up to and including the closing brace
/// is handed to the caller as one complete value. Braces inside quoted strings
/// do not count. The tokenizer knows nothing about the schema of the values.
///
/// Concatenating every delivered value with [`StreamTokenizer::remainder`]
/// always reproduces the input, whatever the chunk boundaries were.
#[derive(Debug, Default)]
pub struct StreamTokenizer {
    buffer: String,
    /// Next byte of `buffer` to examine
    index: usize,
    balance: i64,
    /// End of the last value handed out during the current write
    consumed: usize,
    find_multiple: bool,
}

impl StreamTokenizer {
    /// With `find_multiple` unset, scanning pauses after each complete value
    /// and resumes on the next write.
    pub fn new(find_multiple: bool) -> Self {
        StreamTokenizer {
            find_multiple,
            ..Default::default()
        }
    }

    /// Feed one chunk, calling `callback` once per complete value.
    ///
    /// Returns false on an unbalanced `}` or on a `]` outside of any value.
    /// Values completed before the offending byte are still delivered; the
    /// caller should treat the stream as finished.
    pub fn write<F>(&mut self, chunk: &str, mut callback: F) -> bool
    where
        F: FnMut(&str),
    {
        self.buffer.push_str(chunk);
        let last_index = self.buffer.len();
        let mut index = self.index;
        let mut balanced = true;
        while index < last_index {
            match self.buffer.as_bytes()[index] {
                b'"' => match CLOSING_DOUBLE_QUOTE.find_at(&self.buffer, index) {
                    // Resume on the closing quote itself
                    Some(m) => index = m.end() - 1,
                    // Unterminated string, wait for more input
                    None => break,
                },
                b'{' => self.balance += 1,
                b'}' => {
                    self.balance -= 1;
                    if self.balance < 0 {
                        balanced = false;
                        break;
                    }
                    if self.balance == 0 {
                        self.report(index + 1, &mut callback);
                        if !self.find_multiple {
                            index += 1;
                            break;
                        }
                    }
                }
                b']' if self.balance == 0 => {
                    balanced = false;
                    break;
                }
                _ => {}
            }
            index += 1;
        }
        self.index = index;
        self.flush();
        balanced
    }

    fn report<F>(&mut self, end: usize, callback: &mut F)
    where
        F: FnMut(&str),
    {
        callback(&self.buffer[self.consumed..end]);
        self.consumed = end;
    }

    fn flush(&mut self) {
        if self.consumed == 0 {
            return;
        }
        self.buffer.drain(..self.consumed);
        self.index -= self.consumed;
        self.consumed = 0;
    }

    /// Buffered text that has not been delivered as part of a value
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    /// True while a value has been opened but not closed
    pub fn in_value(&self) -> bool {
        self.balance > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(chunks: &[&str], find_multiple: bool) -> (Vec<String>, String, bool) {
        let mut tokenizer = StreamTokenizer::new(find_multiple);
        let mut values = vec![];
        let mut ok = true;
        for chunk in chunks {
            ok = tokenizer.write(chunk, |v| values.push(v.to_string()));
            if !ok {
                break;
            }
        }
        (values, tokenizer.remainder().to_string(), ok)
    }

    #[test]
    fn test_value_split_across_chunks() {
        let (values, rest, ok) = tokenize(&["{\"a\":", "{\"b\":1}", "}tail"], true);
        assert!(ok);
        assert_eq!(values, vec!["{\"a\":{\"b\":1}}"]);
        assert_eq!(rest, "tail");
    }

    #[test]
    fn test_brace_inside_string() {
        let (values, rest, ok) = tokenize(&[r#"{"a":"}"}"#], true);
        assert!(ok);
        assert_eq!(values, vec![r#"{"a":"}"}"#]);
        assert_eq!(rest, "");
    }

    #[test]
    fn test_escaped_quotes() {
        let input = r#"{"a":"\"}{"}{"b":"\\"}"#;
        let (values, rest, ok) = tokenize(&[input], true);
        assert!(ok);
        assert_eq!(values, vec![r#"{"a":"\"}{"}"#, r#"{"b":"\\"}"#]);
        assert_eq!(rest, "");
    }

    #[test]
    fn test_unterminated_string_waits() {
        let mut tokenizer = StreamTokenizer::new(true);
        let mut values: Vec<String> = vec![];
        assert!(tokenizer.write(r#"{"a":"}\"#, |v| values.push(v.to_string())));
        assert!(values.is_empty());
        assert!(tokenizer.in_value());
        assert!(tokenizer.write(r#""}"}"#, |v| values.push(v.to_string())));
        assert_eq!(values, vec![r#"{"a":"}\"}"}"#]);
        assert!(!tokenizer.in_value());
    }

    #[test]
    fn test_separators_belong_to_next_value() {
        let (values, rest, ok) = tokenize(&["{\"a\":1},\n{\"b\":2} "], true);
        assert!(ok);
        assert_eq!(values, vec!["{\"a\":1}", ",\n{\"b\":2}"]);
        assert_eq!(rest, " ");
    }

    #[test]
    fn test_single_value_mode_pauses() {
        let mut tokenizer = StreamTokenizer::new(false);
        let mut values: Vec<String> = vec![];
        assert!(tokenizer.write("{}{}", |v| values.push(v.to_string())));
        assert_eq!(values, vec!["{}"]);
        assert_eq!(tokenizer.remainder(), "{}");
        assert!(tokenizer.write("", |v| values.push(v.to_string())));
        assert_eq!(values, vec!["{}", "{}"]);
        assert_eq!(tokenizer.remainder(), "");
    }

    #[test]
    fn test_unbalanced_close() {
        let (values, rest, ok) = tokenize(&["{\"a\":1}}{\"b\":2}"], true);
        assert!(!ok);
        assert_eq!(values, vec!["{\"a\":1}"]);
        assert_eq!(rest, "}{\"b\":2}");
    }

    #[test]
    fn test_array_terminator() {
        let (values, rest, ok) = tokenize(&["{\"a\":[1]},", "{\"b\":2}]"], true);
        assert!(!ok);
        assert_eq!(values, vec!["{\"a\":[1]}", ",{\"b\":2}"]);
        assert_eq!(rest, "]");
    }

    #[test]
    fn test_reconstructs_input_for_any_chunking() {
        let input = r#"{"a":"}"}, {"b":{"c":"\\"},"d":"\"{"} {"e":[{"f":1}]} {"g"#;
        for size in 1..=input.len() {
            let chunks: Vec<&str> = input
                .as_bytes()
                .chunks(size)
                .map(|c| std::str::from_utf8(c).unwrap())
                .collect();
            let (values, rest, ok) = tokenize(&chunks, true);
            assert!(ok, "chunk size {}", size);
            assert_eq!(values.len(), 3, "chunk size {}", size);
            assert_eq!(values.concat() + &rest, input, "chunk size {}", size);
        }
    }
}
