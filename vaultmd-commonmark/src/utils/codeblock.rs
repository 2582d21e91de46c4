//! Code protection for the dialect pipeline.
//!
//! Fenced code blocks and inline code spans are lifted out of the working
//! text before any dialect pass runs and replaced by placeholder tokens.
//! Tokens consist only of ASCII letters and digits, so neither the dialect
//! passes nor the base renderer attach any meaning to them, and their prefix
//! is chosen per input so that it never occurs in the document itself.
//!
//! The same side table also carries pre-rendered HTML fragments (math) that
//! must survive the base renderer untouched.
use crate::types::ExtractedCodeBlock;

const TOKEN_PREFIX: &str = "VAULTMDX";

/// Kind of protected content a placeholder stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
  CodeBlock,
  InlineCode,
  Fragment,
}

impl TokenKind {
  const fn tag(self) -> char {
    match self {
      Self::CodeBlock => 'C',
      Self::InlineCode => 'I',
      Self::Fragment => 'F',
    }
  }
}

/// Columns of indentation after which a line is indented code, not a fence.
const MAX_FENCE_INDENT: usize = 3;

/// Opening fence of a code block that has not been closed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenFence {
  fence_char:  char,
  fence_count: usize,
  quote_depth: usize,
  indent:      String,
  language:    Option<String>,
  body:        String,
}

impl OpenFence {
  /// Parse an opening fence line (three or more backticks or tildes).
  ///
  /// `line` has its block quote markers removed already; `quote_depth` is how
  /// many there were. `list_indent` is the content column of the enclosing
  /// list item, if any.
  fn parse(line: &str, quote_depth: usize, list_indent: usize) -> Option<Self> {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];
    if indent_width(indent) > list_indent + MAX_FENCE_INDENT {
      return None;
    }

    let fence_char =
      trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let fence_count =
      trimmed.chars().take_while(|&c| c == fence_char).count();
    if fence_count < 3 {
      return None;
    }

    let info = trimmed[fence_count..].trim();
    // A backtick info string containing backticks is an inline code span
    if fence_char == '`' && info.contains('`') {
      return None;
    }

    Some(Self {
      fence_char,
      fence_count,
      quote_depth,
      indent: indent.to_string(),
      language: info.split_whitespace().next().map(str::to_string),
      body: String::new(),
    })
  }

  /// Whether `line` closes this fence.
  fn is_closed_by(&self, line: &str) -> bool {
    let trimmed = line.trim();
    let count =
      trimmed.chars().take_while(|&c| c == self.fence_char).count();
    count >= self.fence_count
      && trimmed.len() == count * self.fence_char.len_utf8()
  }

  /// Append a content line, removing up to the fence's own indentation.
  fn push_line(&mut self, line: &str) {
    let strip = line
      .bytes()
      .take(self.indent.len())
      .take_while(|b| b.is_ascii_whitespace() && *b != b'\n')
      .count();
    self.body.push_str(&line[strip..]);
  }

  fn into_block(self) -> (usize, String, ExtractedCodeBlock) {
    (self.quote_depth, self.indent, ExtractedCodeBlock {
      language: self.language,
      code:     self.body.trim().to_string(),
    })
  }
}

/// Width of leading whitespace in columns, with tab stops of four.
fn indent_width(indent: &str) -> usize {
  indent.chars().fold(0, |width, c| {
    if c == '\t' { width + 4 - width % 4 } else { width + 1 }
  })
}

/// Remove up to `max_depth` block quote markers from the start of `line`.
///
/// Returns how many markers were removed and the rest of the line.
fn strip_quotes(line: &str, max_depth: usize) -> (usize, &str) {
  let mut rest = line;
  let mut depth = 0;
  while depth < max_depth {
    let trimmed = rest.trim_start_matches(' ');
    if rest.len() - trimmed.len() > MAX_FENCE_INDENT {
      break;
    }
    let Some(after) = trimmed.strip_prefix('>') else {
      break;
    };
    rest = after.strip_prefix(' ').unwrap_or(after);
    depth += 1;
  }
  (depth, rest)
}

/// Content column of a list item line (`- x`, `* x`, `+ x`, `1. x`, `1) x`).
fn list_item_indent(line: &str) -> Option<usize> {
  let trimmed = line.trim_start();
  let lead = indent_width(&line[..line.len() - trimmed.len()]);

  let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
  let marker = match trimmed.as_bytes().get(digits) {
    Some(b'-' | b'*' | b'+') if digits == 0 => 1,
    Some(b'.' | b')') if (1..=9).contains(&digits) => digits + 1,
    _ => return None,
  };

  let after = &trimmed[marker..];
  let content = after.trim_start_matches([' ', '\t']);
  let spaces = after.len() - content.len();
  if spaces == 0 && !content.trim().is_empty() {
    return None;
  }
  Some(lead + marker + spaces.clamp(1, 4))
}

/// Per-conversion side table of protected content.
///
/// An `Extraction` is created by [`extract_code`] at the start of a single
/// conversion and consumed at its end; it is never shared between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
  prefix:      String,
  code_blocks: Vec<ExtractedCodeBlock>,
  inline_code: Vec<String>,
  fragments:   Vec<Fragment>,
}

/// Pre-rendered HTML held back from the base renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fragment {
  html:  String,
  block: bool,
}

impl Extraction {
  /// Create an empty side table whose token prefix does not occur in `input`.
  #[must_use]
  pub fn for_input(input: &str) -> Self {
    let mut prefix = TOKEN_PREFIX.to_string();
    while input.contains(&prefix) {
      prefix.push('X');
    }

    Self {
      prefix,
      code_blocks: Vec::new(),
      inline_code: Vec::new(),
      fragments: Vec::new(),
    }
  }

  /// Code blocks extracted so far, in document order.
  #[must_use]
  pub fn code_blocks(&self) -> &[ExtractedCodeBlock] {
    &self.code_blocks
  }

  /// Number of pre-rendered fragments held for restoration.
  #[must_use]
  pub fn fragment_count(&self) -> usize {
    self.fragments.len()
  }

  /// Whether `text` carries a placeholder of this conversion.
  #[must_use]
  pub fn holds_placeholder(&self, text: &str) -> bool {
    text.contains(&self.prefix)
  }

  /// Placeholder token of the code block at `index`.
  #[must_use]
  pub fn code_block_token(&self, index: usize) -> String {
    self.token(TokenKind::CodeBlock, index)
  }

  fn token(&self, kind: TokenKind, index: usize) -> String {
    format!("{}{}{index}Z", self.prefix, kind.tag())
  }

  /// Record a code block and return its placeholder.
  pub fn push_code_block(&mut self, block: ExtractedCodeBlock) -> String {
    self.code_blocks.push(block);
    self.token(TokenKind::CodeBlock, self.code_blocks.len() - 1)
  }

  /// Record a literal inline code span and return its placeholder.
  pub fn protect_inline_code(&mut self, span: &str) -> String {
    self.inline_code.push(span.to_string());
    self.token(TokenKind::InlineCode, self.inline_code.len() - 1)
  }

  /// Record a block-level HTML fragment and return its placeholder. If the
  /// placeholder ends up as a paragraph of its own, the paragraph is dropped.
  pub fn protect_block_fragment(&mut self, html: String) -> String {
    self.protect_fragment(html, true)
  }

  /// Record an inline HTML fragment and return its placeholder.
  pub fn protect_inline_fragment(&mut self, html: String) -> String {
    self.protect_fragment(html, false)
  }

  fn protect_fragment(&mut self, html: String, block: bool) -> String {
    self.fragments.push(Fragment { html, block });
    self.token(TokenKind::Fragment, self.fragments.len() - 1)
  }

  /// Put inline code spans back in their literal Markdown form.
  #[must_use]
  pub fn restore_inline_code(&self, text: &str) -> String {
    let mut restored = text.to_string();
    for (index, span) in self.inline_code.iter().enumerate() {
      let token = self.token(TokenKind::InlineCode, index);
      restored = restored.replacen(&token, span, 1);
    }
    restored
  }

  /// Substitute rendered code blocks and fragments for their placeholders in
  /// the base renderer's output, in ascending index order.
  ///
  /// A block placeholder that the renderer wrapped in a paragraph is
  /// replaced together with the `<p>` wrapper.
  #[must_use]
  pub fn restore_blocks(&self, html: &str) -> String {
    let mut restored = html.to_string();

    let blocks = self.code_blocks.iter().enumerate().map(|(index, block)| {
      (self.token(TokenKind::CodeBlock, index), block.to_html(), true)
    });
    let fragments =
      self.fragments.iter().enumerate().map(|(index, fragment)| {
        (
          self.token(TokenKind::Fragment, index),
          fragment.html.clone(),
          fragment.block,
        )
      });

    for (token, replacement, block) in blocks.chain(fragments) {
      let wrapped = format!("<p>{token}</p>");
      if block && restored.contains(&wrapped) {
        restored = restored.replacen(&wrapped, &replacement, 1);
      } else if restored.contains(&token) {
        restored = restored.replacen(&token, &replacement, 1);
      } else {
        log::warn!("Placeholder {token} was not found in rendered output");
      }
    }

    restored
  }
}

/// Lift fenced code blocks and inline code spans out of `text`.
///
/// Each fenced block is replaced by a placeholder paragraph at the fence's
/// indentation and block quote depth. A fence ends at its closing fence, at
/// the end of its block quote, or at the end of the document. Lines indented
/// four columns past the enclosing list item are indented code and never
/// open a fence.
#[must_use]
pub fn extract_code(text: &str) -> (String, Extraction) {
  let mut extraction = Extraction::for_input(text);
  let mut output = String::with_capacity(text.len());
  let mut open: Option<OpenFence> = None;
  let mut list_indent = 0;

  for line in text.split_inclusive('\n') {
    if let Some(mut fence) = open.take() {
      let (depth, rest) = strip_quotes(line, fence.quote_depth);
      if depth == fence.quote_depth {
        if fence.is_closed_by(rest) {
          push_block(&mut output, fence, &mut extraction);
        } else {
          fence.push_line(rest);
          open = Some(fence);
        }
        continue;
      }
      // Leaving the block quote closes the fence inside it
      push_block(&mut output, fence, &mut extraction);
    }

    let (depth, rest) = strip_quotes(line, usize::MAX);
    if let Some(fence) = OpenFence::parse(rest, depth, list_indent) {
      open = Some(fence);
      continue;
    }

    if let Some(indent) = list_item_indent(rest) {
      list_indent = indent;
    } else if !rest.trim().is_empty() && !rest.starts_with([' ', '\t']) {
      list_indent = 0;
    }
    output.push_str(&protect_code_spans(line, &mut extraction));
  }

  if let Some(fence) = open {
    log::debug!("Unterminated code fence runs to the end of the document");
    push_block(&mut output, fence, &mut extraction);
  }

  (output, extraction)
}

fn push_block(
  output: &mut String,
  fence: OpenFence,
  extraction: &mut Extraction,
) {
  let (quote_depth, indent, block) = fence.into_block();
  let token = extraction.push_code_block(block);

  if !output.is_empty() && !output.ends_with('\n') {
    output.push('\n');
  }

  if quote_depth == 0 {
    if !output.is_empty() && !output.ends_with("\n\n") {
      output.push('\n');
    }
    output.push_str(&indent);
    output.push_str(&token);
    output.push_str("\n\n");
    return;
  }

  let marker = "> ".repeat(quote_depth);
  let blank = marker.trim_end();
  output.push_str(blank);
  output.push('\n');
  output.push_str(&marker);
  output.push_str(&indent);
  output.push_str(&token);
  output.push('\n');
  output.push_str(blank);
  output.push('\n');
}

/// Replace inline code spans in a single line with placeholders.
///
/// A span opens with a run of backticks and closes at the next run of the
/// same length; a run without a partner is literal text.
fn protect_code_spans(line: &str, extraction: &mut Extraction) -> String {
  if !line.contains('`') {
    return line.to_string();
  }

  let bytes = line.as_bytes();
  let mut result = String::with_capacity(line.len());
  let mut pos = 0;
  let mut copied = 0;

  while pos < bytes.len() {
    if bytes[pos] != b'`' || (pos > 0 && bytes[pos - 1] == b'\\') {
      pos += 1;
      continue;
    }

    let run = backtick_run(bytes, pos);
    match find_closing_run(bytes, pos + run, run) {
      Some(close) => {
        result.push_str(&line[copied..pos]);
        let end = close + run;
        result.push_str(&extraction.protect_inline_code(&line[pos..end]));
        pos = end;
        copied = end;
      },
      None => pos += run,
    }
  }

  result.push_str(&line[copied..]);
  result
}

fn backtick_run(bytes: &[u8], start: usize) -> usize {
  bytes[start..].iter().take_while(|&&b| b == b'`').count()
}

fn find_closing_run(bytes: &[u8], from: usize, len: usize) -> Option<usize> {
  let mut pos = from;
  while pos < bytes.len() {
    if bytes[pos] == b'`' {
      let run = backtick_run(bytes, pos);
      if run == len {
        return Some(pos);
      }
      pos += run;
    } else if bytes[pos] == b'\n' {
      return None;
    } else {
      pos += 1;
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extracts_blocks_in_order() {
    let md = "intro\n```rust\nfn a() {}\n```\n\n~~~\nplain\n~~~\n";
    let (text, extraction) = extract_code(md);

    assert_eq!(extraction.code_blocks().len(), 2);
    assert_eq!(extraction.code_blocks()[0].language.as_deref(), Some("rust"));
    assert_eq!(extraction.code_blocks()[0].code, "fn a() {}");
    assert_eq!(extraction.code_blocks()[1].language, None);
    assert_eq!(extraction.code_blocks()[1].code, "plain");

    let first = extraction.code_block_token(0);
    let second = extraction.code_block_token(1);
    assert!(text.contains(&format!("intro\n\n{first}\n\n")));
    assert!(text.contains(&second));
    assert!(!text.contains("fn a()"));
  }

  #[test]
  fn test_closing_fence_must_match_opening() {
    let md = "````md\n```\ninner\n```\n````\n";
    let (_, extraction) = extract_code(md);

    assert_eq!(extraction.code_blocks().len(), 1);
    assert_eq!(extraction.code_blocks()[0].code, "```\ninner\n```");
  }

  #[test]
  fn test_unterminated_fence_runs_to_end() {
    let md = "text\n```\n==not a highlight==\n";
    let (text, extraction) = extract_code(md);

    assert_eq!(extraction.code_blocks().len(), 1);
    assert_eq!(extraction.code_blocks()[0].code, "==not a highlight==");
    assert!(!text.contains("=="));
  }

  #[test]
  fn test_language_is_first_info_word() {
    let (_, extraction) =
      extract_code("```  python title=\"x\"  \nprint(1)\n```");
    assert_eq!(
      extraction.code_blocks()[0].language.as_deref(),
      Some("python")
    );
  }

  #[test]
  fn test_indented_fence_is_dedented() {
    let md = "- item\n\n  ```sh\n  ls\n    -la\n  ```\n";
    let (text, extraction) = extract_code(md);

    assert_eq!(extraction.code_blocks()[0].code, "ls\n  -la");
    let token = extraction.code_block_token(0);
    assert!(text.contains(&format!("- item\n\n  {token}\n\n")));
  }

  #[test]
  fn test_prefix_avoids_input() {
    let extraction = Extraction::for_input("VAULTMDX and VAULTMDXX");
    let token = extraction.code_block_token(0);
    assert!(token.starts_with("VAULTMDXXX"));
  }

  #[test]
  fn test_inline_code_round_trip() {
    let line = "use `==x==` and ``a ` b`` but not \\`this`";
    let mut extraction = Extraction::for_input(line);
    let protected = protect_code_spans(line, &mut extraction);

    assert!(!protected.contains("==x=="));
    assert!(!protected.contains("a ` b"));
    assert!(protected.contains("\\`this`"));
    assert_eq!(extraction.restore_inline_code(&protected), line);
  }

  #[test]
  fn test_restore_replaces_paragraph_wrapper() {
    let mut extraction = Extraction::for_input("");
    let token = extraction.push_code_block(ExtractedCodeBlock {
      language: Some("sh".to_string()),
      code:     "echo <hi>".to_string(),
    });
    let html = extraction.restore_blocks(&format!("<p>{token}</p>\n"));

    assert_eq!(
      html,
      "<pre><code class=\"language-sh\">echo &lt;hi&gt;</code></pre>\n"
    );
  }

  #[test]
  fn test_fence_inside_block_quote() {
    let (text, extraction) =
      extract_code("> [!NOTE] Code\n> ```rust\n> ==x== [[y]]\n> ```\n");

    assert_eq!(extraction.code_blocks().len(), 1);
    assert_eq!(extraction.code_blocks()[0].code, "==x== [[y]]");
    assert_eq!(extraction.code_blocks()[0].language.as_deref(), Some("rust"));
    let token = extraction.code_block_token(0);
    assert_eq!(text, format!("> [!NOTE] Code\n>\n> {token}\n>\n"));
  }

  #[test]
  fn test_quoted_fence_closes_with_quote() {
    let (text, extraction) = extract_code("> ```\n> a\nafter\n");

    assert_eq!(extraction.code_blocks()[0].code, "a");
    assert!(text.ends_with(">\nafter\n"));
  }

  #[test]
  fn test_indented_code_is_not_a_fence() {
    let input = "para\n\n    ```\n    code\n    ```\n";
    let (text, extraction) = extract_code(input);
    assert!(extraction.code_blocks().is_empty());
    assert_eq!(text, input);

    // Inside a list item the indent counts from the item's content
    let (_, extraction) = extract_code("1. item\n\n    ```\n    x\n    ```\n");
    assert_eq!(extraction.code_blocks().len(), 1);
  }

  #[test]
  fn test_list_item_indent() {
    assert_eq!(list_item_indent("- a"), Some(2));
    assert_eq!(list_item_indent("  10. a"), Some(6));
    assert_eq!(list_item_indent("**bold**"), None);
    assert_eq!(list_item_indent("-"), Some(2));
    assert_eq!(indent_width("\t "), 5);
  }
}
