//! A read cursor over text with transactional rollback.

/// Walks a `&str` left to right. All positions are byte offsets on char boundaries.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub const fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Current position, usable with [`Cursor::reset_to`].
    pub const fn mark(&self) -> usize {
        self.pos
    }

    /// Moves back to a position previously returned by [`Cursor::mark`].
    pub fn reset_to(&mut self, mark: usize) {
        debug_assert!(mark <= self.src.len() && self.src.is_char_boundary(mark));
        self.pos = mark;
    }

    /// Runs `f`, restoring the position if it fails.
    pub fn transaction<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let mark = self.mark();
        let result = f(self);
        if result.is_err() {
            self.reset_to(mark);
        }
        result
    }

    /// Input consumed since `mark`.
    pub fn since(&self, mark: usize) -> &'a str {
        &self.src[mark..self.pos]
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.src.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consumes `c` if it is next.
    pub fn eat(&mut self, c: char) -> bool {
        self.eat_if(|next| next == c).is_some()
    }

    /// Consumes the next char if it satisfies `pred`.
    pub fn eat_if(&mut self, pred: impl FnOnce(char) -> bool) -> Option<char> {
        let next = self.peek().filter(|&c| pred(c))?;
        self.pos += next.len_utf8();
        Some(next)
    }

    /// Consumes `word` if the input continues with it, ignoring ASCII case.
    pub fn eat_ignore_case(&mut self, word: &str) -> bool {
        let rest = self.rest();
        let matches = rest.get(..word.len()).is_some_and(|head| head.eq_ignore_ascii_case(word));
        if matches {
            self.pos += word.len();
        }
        matches
    }

    /// Consumes the longest prefix whose chars satisfy `pred`.
    pub fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Consumes at least `min` and at most `max` ASCII digits. Consumes nothing if fewer than
    /// `min` are present.
    pub fn take_digits(&mut self, min: usize, max: usize) -> Option<&'a str> {
        let run = self.digit_run();
        if run < min {
            return None;
        }
        let len = run.min(max);
        let digits = &self.rest()[..len];
        self.pos += len;
        Some(digits)
    }

    /// Length of the run of ASCII digits at the cursor.
    pub fn digit_run(&self) -> usize {
        self.rest().bytes().take_while(u8::is_ascii_digit).count()
    }

    /// Skips whitespace.
    pub fn trim_start(&mut self) {
        self.take_while(char::is_whitespace);
    }

    /// Offset of the first `c` in the unconsumed input.
    pub fn find(&self, c: char) -> Option<usize> {
        self.rest().find(c)
    }
}
