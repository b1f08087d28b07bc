//! Kakoune command construction and quoting

/// Quote a string as a single Kakoune argument.
///
/// Single-quoted strings are taken verbatim by the editor; the only escape
/// is a doubled single quote.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Split text produced with `-quoting kakoune` back into its values.
///
/// Returns `None` when the text is not a sequence of single-quoted words.
pub fn unquote_all(text: &str) -> Option<Vec<String>> {
    let mut values = Vec::new();
    let mut chars = text.trim_end_matches('\n').chars().peekable();

    loop {
        while chars.next_if_eq(&' ').is_some() {}
        match chars.next() {
            None => return Some(values),
            Some('\'') => {}
            Some(_) => return None,
        }

        let mut value = String::new();
        loop {
            match chars.next() {
                // Doubled quote is an escaped quote, a single one ends the word
                Some('\'') if chars.next_if_eq(&'\'').is_some() => value.push('\''),
                Some('\'') => break,
                Some(c) => value.push(c),
                None => return None,
            }
        }

        match chars.peek() {
            None | Some(' ') => values.push(value),
            Some(_) => return None,
        }
    }
}

/// A command addressed to a session, optionally scoped to a buffer and/or
/// routed through a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message<'a> {
    command: &'a str,
    buffer: &'a str,
    client: &'a str,
}

impl<'a> Message<'a> {
    pub fn new(command: &'a str) -> Self {
        Self {
            command,
            ..Default::default()
        }
    }

    /// Run in this buffer instead of the client's current one
    pub fn in_buffer(mut self, buffer: &'a str) -> Self {
        self.buffer = buffer;
        self
    }

    /// Run in this client's context
    pub fn for_client(mut self, client: &'a str) -> Self {
        self.client = client;
        self
    }

    /// Render the text written to the control channel.
    ///
    /// The buffer scope is innermost so it applies whichever client runs the
    /// command. Errors are caught and echoed to the `*debug*` buffer since
    /// the channel has no way to report them back.
    pub fn render(&self) -> String {
        let mut body = self.command.to_string();
        if !self.buffer.is_empty() {
            body = format!(
                "evaluate-commands -buffer {} {}",
                quote(self.buffer),
                quote(&body)
            );
        }
        if !self.client.is_empty() {
            body = format!(
                "evaluate-commands -client {} {}",
                quote(self.client),
                quote(&body)
            );
        }
        format!(
            "try {} catch {}\n",
            quote(&body),
            quote("echo -debug kks: %val{error}")
        )
    }
}
