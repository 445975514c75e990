//! Key-sequence normalization
//!
//! Collectors report left-hand sides exactly as the user typed them, so the
//! same binding can show up as `<Space>pf`, ` pf` or `<leader>pf`. The
//! normalizer rewrites every sequence into one canonical spelling.

/// Canonicalizes left-hand-side key sequences
#[derive(Debug, Clone)]
pub struct KeyNormalizer {
    leader: String,
    localleader: String,
}

impl Default for KeyNormalizer {
    fn default() -> Self {
        Self::new(" ", "\\")
    }
}

impl KeyNormalizer {
    /// `leader` and `localleader` are the raw key strings the editor expands
    pub fn new(leader: &str, localleader: &str) -> Self {
        KeyNormalizer {
            leader: canonical_sequence(leader),
            localleader: canonical_sequence(localleader),
        }
    }

    /// Normalize a key sequence; the result is a fixed point of this function
    pub fn normalize(&self, lhs: &str) -> String {
        let canonical = canonical_sequence(lhs);

        if let Some(rest) = strip_leading(&canonical, &self.leader) {
            return format!("<leader>{}", rest);
        }
        if let Some(rest) = strip_leading(&canonical, &self.localleader) {
            return format!("<localleader>{}", rest);
        }
        canonical
    }
}

fn strip_leading<'a>(sequence: &'a str, leader: &str) -> Option<&'a str> {
    if leader.is_empty() {
        return None;
    }
    sequence.strip_prefix(leader)
}

/// Split a sequence into `<...>` groups and single characters
pub fn tokenize(sequence: &str) -> Vec<String> {
    let chars: Vec<char> = sequence.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '<' {
            if let Some(len) = angle_group_len(&chars[i..]) {
                tokens.push(chars[i..i + len].iter().collect());
                i += len;
                continue;
            }
        }
        tokens.push(chars[i].to_string());
        i += 1;
    }

    tokens
}

/// Length of a `<name>` group starting at `chars[0]`, if one is there
fn angle_group_len(chars: &[char]) -> Option<usize> {
    // `<C->>` style groups end with a `>` that is itself the key
    for (idx, c) in chars.iter().enumerate().skip(1) {
        match c {
            '>' if idx > 1 => {
                let inner: String = chars[1..idx].iter().collect();
                if inner.ends_with('-') && chars.get(idx + 1) == Some(&'>') {
                    return Some(idx + 2);
                }
                return Some(idx + 1);
            }
            '<' => return None,
            c if c.is_whitespace() || c.is_control() => return None,
            _ => {}
        }
    }
    None
}

fn canonical_sequence(sequence: &str) -> String {
    tokenize(sequence)
        .iter()
        .map(|token| canonical_token(token))
        .collect()
}

fn canonical_token(token: &str) -> String {
    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(named) = raw_key_name(c) {
            return named;
        }
    }
    match token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        Some(inner) if !inner.is_empty() => canonical_group(inner),
        _ => token.to_string(),
    }
}

/// Spelling for a literal whitespace or control character; the result never
/// contains whitespace, so remote columns can be trimmed safely
fn raw_key_name(c: char) -> Option<String> {
    let name = match c {
        ' ' => "<Space>".to_string(),
        '\t' => "<Tab>".to_string(),
        '\n' => "<NL>".to_string(),
        '\r' => "<CR>".to_string(),
        '\u{1b}' => "<Esc>".to_string(),
        '\0' => "<Nul>".to_string(),
        '\u{1}'..='\u{1a}' => format!("<C-{}>", (b'a' + c as u8 - 1) as char),
        c if c.is_control() || c.is_whitespace() => format!("<Char-{}>", c as u32),
        _ => return None,
    };
    Some(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Modifier {
    Ctrl,
    Meta,
    Shift,
    Super,
}

impl Modifier {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "c" | "ctrl" | "control" => Some(Modifier::Ctrl),
            "m" | "a" | "alt" | "meta" => Some(Modifier::Meta),
            "s" | "shift" => Some(Modifier::Shift),
            "d" | "cmd" | "super" => Some(Modifier::Super),
            _ => None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Modifier::Ctrl => "C",
            Modifier::Meta => "M",
            Modifier::Shift => "S",
            Modifier::Super => "D",
        }
    }
}

fn canonical_group(inner: &str) -> String {
    let mut modifiers = Vec::new();
    let mut rest = inner;

    while let Some(pos) = rest.find('-') {
        if pos == 0 || pos + 1 >= rest.len() {
            break;
        }
        match Modifier::parse(&rest[..pos]) {
            Some(modifier) => {
                modifiers.push(modifier);
                rest = &rest[pos + 1..];
            }
            None => break,
        }
    }

    modifiers.sort();
    modifiers.dedup();

    let single_char = rest.chars().count() == 1;
    let key = if single_char {
        if modifiers == [Modifier::Ctrl] {
            rest.to_lowercase()
        } else {
            rest.to_string()
        }
    } else {
        named_key(rest)
    };

    if modifiers.is_empty() {
        if single_char {
            return key;
        }
        return format!("<{}>", key);
    }

    let prefix: Vec<&str> = modifiers.iter().map(Modifier::symbol).collect();
    format!("<{}-{}>", prefix.join("-"), key)
}

fn named_key(name: &str) -> String {
    let lower = name.to_lowercase();
    let canonical = match lower.as_str() {
        "cr" | "return" | "enter" => "CR",
        "nl" | "newline" | "linefeed" => "NL",
        "nul" => "Nul",
        "esc" | "escape" => "Esc",
        "bs" | "backspace" => "BS",
        "space" => "Space",
        "tab" => "Tab",
        "del" | "delete" => "Del",
        "lt" => "lt",
        "bar" => "Bar",
        "bslash" => "Bslash",
        "up" => "Up",
        "down" => "Down",
        "left" => "Left",
        "right" => "Right",
        "home" => "Home",
        "end" => "End",
        "pageup" => "PageUp",
        "pagedown" => "PageDown",
        "insert" | "ins" => "Insert",
        "nop" => "Nop",
        "plug" => "Plug",
        "cmd" => "Cmd",
        "snr" => "SNR",
        "sid" => "SID",
        "leader" => "leader",
        "localleader" => "localleader",
        _ => "",
    };
    if !canonical.is_empty() {
        return canonical.to_string();
    }

    if let Some(digits) = lower.strip_prefix('f') {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return format!("F{}", digits);
        }
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
