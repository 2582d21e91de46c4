//! Dialect rewrite passes.
//!
//! Every pass takes the working text and returns the rewritten text. Passes
//! never fail: syntax that does not match a pass exactly is left as literal
//! text for the base renderer.
use std::{ops::Range, path::Path, sync::LazyLock};

use regex::{Captures, Regex};

use crate::{
  types::ConverterConfig,
  utils::{self, codeblock::Extraction, pass_regex},
};

static EMBED_RE: LazyLock<Regex> = LazyLock::new(|| {
  pass_regex("EMBED_RE", r"!\[\[([^\]|]+)(?:\|([^\]]*))?\]\]")
});

static WIKILINK_RE: LazyLock<Regex> = LazyLock::new(|| {
  pass_regex("WIKILINK_RE", r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]")
});

static HIGHLIGHT_RE: LazyLock<Regex> =
  LazyLock::new(|| pass_regex("HIGHLIGHT_RE", r"==(.*?)=="));

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
  pass_regex("LINK_RE", r"\[([^\]]+)\]\(([^)]+)\)")
});

static EXTERNAL_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
  pass_regex(
    "EXTERNAL_URL_RE",
    r"^(?:[a-zA-Z][a-zA-Z0-9+.-]*:|//|#)",
  )
});

static CALLOUT_RE: LazyLock<Regex> = LazyLock::new(|| {
  pass_regex(
    "CALLOUT_RE",
    r"^[ \t]{0,3}>[ \t]?\[!(\w+)\][+-]?(?:[ \t]+(.*?))?[ \t]*$",
  )
});

static TAG_RE: LazyLock<Regex> =
  LazyLock::new(|| pass_regex("TAG_RE", r"(?m)(^|\s)#(\w[\w/]*)"));

static MATH_RE: LazyLock<Regex> = LazyLock::new(|| {
  pass_regex(
    "MATH_RE",
    r"\$\$([^$]+)\$\$|\$([^$\s](?:[^$\n]*[^$\s\\])?)\$",
  )
});

static CHECKBOX_RE: LazyLock<Regex> = LazyLock::new(|| {
  pass_regex("CHECKBOX_RE", r"(?m)^([ \t]*[-*+] )\[([ xX])\] ")
});

/// File extensions rendered as `<img>` by the embed pass.
const IMAGE_EXTENSIONS: &[&str] = &[
  "png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "avif", "ico", "tif",
  "tiff",
];

/// Explicit pixel dimensions requested by an embed size modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmbedSize {
  pub width:  Option<u32>,
  pub height: Option<u32>,
}

impl EmbedSize {
  /// Parse the text after `|` in `![[path|modifier]]`.
  ///
  /// Accepted forms, in order: `WxH`, `width=N`, `height=N`, `N`. Anything
  /// else, including numbers that overflow, yields no size.
  #[must_use]
  pub fn parse(modifier: &str) -> Self {
    let modifier = modifier.trim();

    if let Some((width, height)) = modifier.split_once('x')
      && is_digits(width)
      && is_digits(height)
    {
      return match (width.parse().ok(), height.parse().ok()) {
        (Some(width), Some(height)) => {
          Self {
            width:  Some(width),
            height: Some(height),
          }
        },
        _ => Self::default(),
      };
    }

    if let Some(width) = modifier.strip_prefix("width=") {
      return Self {
        width:  parse_pixels(width),
        height: None,
      };
    }

    if let Some(height) = modifier.strip_prefix("height=") {
      return Self {
        width:  None,
        height: parse_pixels(height),
      };
    }

    Self {
      width:  parse_pixels(modifier),
      height: None,
    }
  }

  /// Inline style attribute for the resolved dimensions, if any.
  #[must_use]
  pub fn style_attr(&self) -> String {
    let style = match (self.width, self.height) {
      (Some(width), Some(height)) => {
        format!("width:{width}px; height:{height}px;")
      },
      (Some(width), None) => format!("width:{width}px;"),
      (None, Some(height)) => format!("height:{height}px;"),
      (None, None) => return String::new(),
    };
    format!(" style=\"{style}\"")
  }
}

fn is_digits(s: &str) -> bool {
  !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_pixels(s: &str) -> Option<u32> {
  if is_digits(s) { s.parse().ok() } else { None }
}

/// Whether an embed target is rendered as an image.
///
/// Paths without an extension are images; other extensions must be known
/// image formats.
#[must_use]
pub fn is_image_path(path: &str) -> bool {
  Path::new(path)
    .extension()
    .and_then(|ext| ext.to_str())
    .is_none_or(|ext| {
      IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
    })
}

/// Process embeds: `![[path]]` and `![[path|size]]`.
///
/// # Arguments
///
/// * `content` - The working text
/// * `config` - Converter configuration providing the media prefix
/// * `extraction` - Side table of the conversion; paths holding protected
///   inline code are left alone
///
/// # Returns
///
/// The text with every embed replaced by an `<img>` or a file link
#[must_use]
pub fn process_embeds(
  content: &str,
  config: &ConverterConfig,
  extraction: &Extraction,
) -> String {
  EMBED_RE
    .replace_all(content, |caps: &Captures| {
      let path = caps[1].trim();
      if extraction.holds_placeholder(path) {
        return caps[0].to_string();
      }
      let src = utils::attr_escape(&format!("{}{path}", config.media_url));

      if is_image_path(path) {
        let size = caps
          .get(2)
          .map(|m| EmbedSize::parse(m.as_str()))
          .unwrap_or_default();
        format!(
          "<img src=\"{src}\" alt=\"{}\"{}>",
          utils::attr_escape(path),
          size.style_attr()
        )
      } else {
        format!("<a href=\"{src}\">{}</a>", utils::html_escape(path))
      }
    })
    .into_owned()
}

/// Process wikilinks: `[[target]]` and `[[target|alias]]`.
///
/// A `[[` directly preceded by `!` belongs to an embed and is left alone, as
/// is a target that slugs to nothing or holds protected inline code.
#[must_use]
pub fn process_wikilinks(
  content: &str,
  config: &ConverterConfig,
  extraction: &Extraction,
) -> String {
  WIKILINK_RE
    .replace_all(content, |caps: &Captures| {
      let Some(whole) = caps.get(0) else {
        return String::new();
      };
      let target = &caps[1];
      let slug = utils::page_slug(target);

      if content[..whole.start()].ends_with('!')
        || slug.is_empty()
        || extraction.holds_placeholder(target)
      {
        return whole.as_str().to_string();
      }

      let text = caps.get(2).map_or(target, |alias| alias.as_str().trim());
      format!(
        "<a href=\"{}\">{}</a>",
        utils::attr_escape(&format!("{}{slug}/", config.base_url)),
        utils::html_escape(text)
      )
    })
    .into_owned()
}

/// Process highlights: `==text==` becomes `<mark>text</mark>`.
///
/// Lines made only of `=` are setext heading underlines and are skipped, as
/// are markers inside an HTML tag or inside math.
#[must_use]
pub fn process_highlights(content: &str) -> String {
  let math = math_spans(content);
  HIGHLIGHT_RE
    .replace_all(content, |caps: &Captures| {
      let Some(whole) = caps.get(0) else {
        return String::new();
      };
      let start = whole.start();
      let line = line_at(content, start).trim();
      if line.bytes().all(|b| b == b'=')
        || inside_html_tag(content, start)
        || in_spans(&math, start)
      {
        return whole.as_str().to_string();
      }
      format!("<mark>{}</mark>", &caps[1])
    })
    .into_owned()
}

/// Whether a link target points outside the vault: anything starting with a
/// URL scheme and `:`, a protocol-relative URL, or an in-page anchor.
#[must_use]
pub fn is_external_target(target: &str) -> bool {
  EXTERNAL_URL_RE.is_match(target.trim())
}

/// Build the href of an internal page link.
///
/// The page part is slugged and prefixed with `base_url` unless it is
/// already absolute; a trailing `/` is added and any `#fragment` is kept.
#[must_use]
pub fn internal_href(target: &str, base_url: &str) -> String {
  let (page, fragment) = target
    .trim()
    .split_once('#')
    .map_or((target.trim(), None), |(page, frag)| (page, Some(frag)));

  let slug = utils::page_slug(page);
  let mut href = if slug.starts_with('/') {
    slug
  } else {
    format!("{base_url}{slug}")
  };
  if !href.ends_with('/') {
    href.push('/');
  }
  if let Some(fragment) = fragment {
    href.push('#');
    href.push_str(fragment);
  }
  href
}

/// Process standard Markdown links to vault pages: `[text](page)`.
///
/// External targets, targets holding protected inline code and Markdown
/// images (`![alt](src)`) are left for the base renderer.
#[must_use]
pub fn process_standard_links(
  content: &str,
  config: &ConverterConfig,
  extraction: &Extraction,
) -> String {
  LINK_RE
    .replace_all(content, |caps: &Captures| {
      let Some(whole) = caps.get(0) else {
        return String::new();
      };
      let target = &caps[2];

      if content[..whole.start()].ends_with('!')
        || is_external_target(target)
        || extraction.holds_placeholder(target)
      {
        return whole.as_str().to_string();
      }

      format!(
        "<a href=\"{}\">{}</a>",
        utils::attr_escape(&internal_href(target, &config.base_url)),
        &caps[1]
      )
    })
    .into_owned()
}

/// CSS class for a callout type.
#[must_use]
pub fn callout_class(kind: &str) -> &'static str {
  match kind.to_ascii_uppercase().as_str() {
    "INFO" => "callout-info",
    "WARNING" => "callout-warning",
    "NOTE" => "callout-note",
    _ => "callout",
  }
}

/// Strip one block quote level from a line, if it is quoted.
fn strip_quote(line: &str) -> Option<&str> {
  let rest = line.trim_start().strip_prefix('>')?;
  Some(rest.strip_prefix(' ').unwrap_or(rest))
}

fn open_callout(output: &mut String, caps: &Captures) {
  let kind = &caps[1];
  let title = caps
    .get(2)
    .map(|m| m.as_str().trim())
    .filter(|title| !title.is_empty())
    .map_or_else(
      || utils::capitalize_first(&kind.to_lowercase()),
      str::to_string,
    );

  if !output.is_empty() && !output.ends_with("\n\n") {
    output.push('\n');
  }
  output.push_str(&format!(
    "<div class=\"{}\" data-callout=\"{}\">\n<p \
     class=\"callout-title\">{title}</p>\n\n",
    callout_class(kind),
    utils::attr_escape(&kind.to_lowercase())
  ));
}

fn close_callout(output: &mut String) {
  output.push_str("\n</div>\n\n");
}

/// Process callouts: a block quote opened by `> [!TYPE] Title`.
///
/// The container is closed where the block quote ends. Body lines lose one
/// quote level and are rendered as Markdown inside the container.
#[must_use]
pub fn process_callouts(content: &str) -> String {
  let mut output = String::with_capacity(content.len());
  let mut in_callout = false;

  for line in content.split_inclusive('\n') {
    let bare = line.trim_end_matches(['\n', '\r']);

    if let Some(caps) = CALLOUT_RE.captures(bare) {
      if in_callout {
        close_callout(&mut output);
      }
      open_callout(&mut output, &caps);
      in_callout = true;
      continue;
    }

    if in_callout {
      if let Some(body) = strip_quote(bare) {
        output.push_str(body);
        output.push('\n');
        continue;
      }
      close_callout(&mut output);
      in_callout = false;
    }

    output.push_str(line);
  }

  if in_callout {
    close_callout(&mut output);
  }

  output
}

/// Whether `pos` lies inside an HTML tag on its line, e.g. in an attribute.
fn inside_html_tag(content: &str, pos: usize) -> bool {
  let before = &content[..pos];
  let line = before.rfind('\n').map_or(before, |nl| &before[nl + 1..]);
  match (line.rfind('<'), line.rfind('>')) {
    (Some(open), Some(close)) => open > close,
    (Some(_), None) => true,
    _ => false,
  }
}

/// The line of `content` holding byte offset `pos`, without its newline.
fn line_at(content: &str, pos: usize) -> &str {
  let start = content[..pos].rfind('\n').map_or(0, |nl| nl + 1);
  let end = content[pos..].find('\n').map_or(content.len(), |nl| pos + nl);
  &content[start..end]
}

/// Byte ranges of the math spans `process_math` will replace.
fn math_spans(content: &str) -> Vec<Range<usize>> {
  MATH_RE
    .find_iter(content)
    .filter(|m| !content[..m.start()].ends_with('\\'))
    .map(|m| m.range())
    .collect()
}

fn in_spans(spans: &[Range<usize>], pos: usize) -> bool {
  spans.iter().any(|span| span.contains(&pos))
}

/// Process tags: `#tag` and `#tag/subtag` after whitespace or at line start.
///
/// Tags inside an HTML tag or inside math are left alone.
#[must_use]
pub fn process_tags(content: &str) -> String {
  let math = math_spans(content);
  TAG_RE
    .replace_all(content, |caps: &Captures| {
      let (Some(whole), Some(tag)) = (caps.get(0), caps.get(2)) else {
        return String::new();
      };
      if inside_html_tag(content, tag.start()) || in_spans(&math, tag.start())
      {
        return whole.as_str().to_string();
      }
      format!("{}<span class=\"tag\">#{}</span>", &caps[1], tag.as_str())
    })
    .into_owned()
}

/// Process math: `$$block$$` and `$inline$` in one scan.
///
/// Double delimiters win over single ones at every position, so block math
/// is never split by the inline form. Inline math may not start or end with
/// whitespace and an escaped `\$` never opens math. The rendered elements are
/// stored in `extraction` and only their placeholders remain in the text.
#[must_use]
pub fn process_math(content: &str, extraction: &mut Extraction) -> String {
  MATH_RE
    .replace_all(content, |caps: &Captures| {
      let Some(whole) = caps.get(0) else {
        return String::new();
      };
      if content[..whole.start()].ends_with('\\') {
        return whole.as_str().to_string();
      }

      if let Some(block) = caps.get(1) {
        extraction.protect_block_fragment(format!(
          "<div class=\"math math-block\">{}</div>",
          utils::html_escape(block.as_str().trim())
        ))
      } else {
        extraction.protect_inline_fragment(format!(
          "<span class=\"math math-inline\">{}</span>",
          utils::html_escape(&caps[2])
        ))
      }
    })
    .into_owned()
}

/// Process task list checkboxes: `- [ ] `, `- [x] ` and `- [X] `.
///
/// Only the `[ ]` marker is replaced, the bullet stays for the base renderer.
#[must_use]
pub fn process_checkboxes(content: &str) -> String {
  CHECKBOX_RE
    .replace_all(content, |caps: &Captures| {
      let checked = if &caps[2] == " " { "" } else { " checked" };
      format!("{}<input type=\"checkbox\" disabled{checked}> ", &caps[1])
    })
    .into_owned()
}
