//! Semantic Grouper
//!
//! Pairs each operation with the source, returns and parameters it governs,
//! by text position rather than by category.
//!
//! ```text
//! "Parse JSON data from file, validate structure, transform to CSV"
//!  parse ─┬─ json ─ file          validate        transform ─ csv
//!         │                          │                │
//!  [OP:parse][SRC:file][RET:json] [OP:validate] [OP:transform][RET:text]
//! ```
//!
//! Collecting all operations, then all sources, then all returns would lose
//! which return belongs to which step. Instead, with operations sorted by
//! offset and each operation's span running to the next operation:
//!
//! 1. The first operation claims the first-mentioned source
//! 2. Later operations claim the nearest unclaimed source between the
//!    previous operation and themselves
//! 3. "<op> to <format>" pulls that return into the operation's group
//! 4. Returns inside a span belong to that span's operation; leftovers go
//!    to the last group
//! 5. Parameters belong to the span that contains them

use crate::detector::DetectedCue;
use molt_core::{Category, Token, TokenSequence};

/// Default characters scanned after "<op> to"
pub const DEFAULT_RETURN_LOOKAHEAD: usize = 24;

/// One operation and the tokens that belong to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationGroup {
    pub operation: Token,
    /// Text offset of the operation cue
    pub offset: usize,
    pub source: Option<Token>,
    pub returns: Vec<Token>,
    pub params: Vec<Token>,
}

impl OperationGroup {
    fn new(cue: &DetectedCue) -> Self {
        Self {
            operation: cue.token.clone(),
            offset: cue.offset,
            source: None,
            returns: Vec::new(),
            params: Vec::new(),
        }
    }

    fn add_return(&mut self, token: &Token) {
        if !self.returns.iter().any(|r| r.subtype() == token.subtype()) {
            self.returns.push(token.clone());
        }
    }

    /// Operation, source, parameters, returns
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        std::iter::once(&self.operation)
            .chain(self.source.iter())
            .chain(self.params.iter())
            .chain(self.returns.iter())
    }
}

/// Operation groups plus the structural cues around them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    /// Groups in operation text order
    pub groups: Vec<OperationGroup>,
    /// Source, parameter and return cues found when there is no operation
    pub orphans: Vec<DetectedCue>,
    pub modifiers: Vec<DetectedCue>,
    pub control: Vec<DetectedCue>,
    pub errors: Vec<DetectedCue>,
    pub types: Vec<DetectedCue>,
    /// Retry count that follows an `ERR:retry`
    pub retry_times: Option<DetectedCue>,
}

impl Grouping {
    /// Flatten into wire order
    ///
    /// ```text
    /// try → modifiers → if/else/loop → groups → cached → catch → finally
    ///     → retry (+times), log → fail, ignore → types
    /// ```
    ///
    /// A catch is implied when there is a try plus a retry or log.
    pub fn flatten(&self) -> TokenSequence {
        let mut sequence = TokenSequence::new();
        let control = |subtype: &'static str| {
            self.control
                .iter()
                .filter(move |c| c.token.subtype() == subtype)
        };

        for cue in control("try") {
            sequence.push(cue.token.clone());
        }
        for cue in self.modifiers.iter().filter(|c| c.token.subtype() != "cached") {
            sequence.push(cue.token.clone());
        }
        for cue in self
            .control
            .iter()
            .filter(|c| !matches!(c.token.subtype(), "try" | "catch" | "finally"))
        {
            sequence.push(cue.token.clone());
        }

        if self.groups.is_empty() {
            for cue in &self.orphans {
                sequence.push(cue.token.clone());
            }
        }
        for group in &self.groups {
            for token in group.tokens() {
                sequence.push(token.clone());
            }
        }

        for cue in self.modifiers.iter().filter(|c| c.token.subtype() == "cached") {
            sequence.push(cue.token.clone());
        }

        let has_try = control("try").next().is_some();
        let handles = self
            .errors
            .iter()
            .any(|c| matches!(c.token.subtype(), "retry" | "log"));
        let mut catches = control("catch").peekable();
        if catches.peek().is_none() && has_try && handles {
            sequence.push(Token::new(Category::ControlFlow, "catch"));
        }
        for cue in catches {
            sequence.push(cue.token.clone());
        }
        for cue in control("finally") {
            sequence.push(cue.token.clone());
        }

        for subtype in ["retry", "log"] {
            for cue in self.errors.iter().filter(|c| c.token.subtype() == subtype) {
                sequence.push(cue.token.clone());
                if subtype == "retry" {
                    if let Some(times) = &self.retry_times {
                        sequence.push(times.token.clone());
                    }
                }
            }
        }
        for cue in self
            .errors
            .iter()
            .filter(|c| !matches!(c.token.subtype(), "retry" | "log"))
        {
            sequence.push(cue.token.clone());
        }

        let returns: Vec<&Token> = self
            .groups
            .iter()
            .flat_map(|g| g.returns.iter())
            .chain(
                self.orphans
                    .iter()
                    .map(|c| &c.token)
                    .filter(|t| t.category() == Category::ReturnType),
            )
            .collect();
        for cue in &self.types {
            let implied = returns
                .iter()
                .any(|r| implied_types(r.subtype()).contains(&cue.token.subtype()));
            if !implied && !sequence.contains(Category::TypeConstraint, cue.token.subtype()) {
                sequence.push(cue.token.clone());
            }
        }

        sequence
    }
}

/// Type constraints a return type already states
fn implied_types(return_subtype: &str) -> &'static [&'static str] {
    match return_subtype {
        "json" | "text" => &["str"],
        "list" => &["list"],
        "dict" => &["dict"],
        "bool" => &["bool"],
        "num" => &["int", "float"],
        _ => &[],
    }
}

/// The semantic grouper
#[derive(Debug, Clone, Copy)]
pub struct SemanticGrouper {
    return_lookahead: usize,
}

impl Default for SemanticGrouper {
    fn default() -> Self {
        Self::new(DEFAULT_RETURN_LOOKAHEAD)
    }
}

impl SemanticGrouper {
    pub fn new(return_lookahead: usize) -> Self {
        Self { return_lookahead }
    }

    /// Group the cues detected in `text`
    pub fn group(&self, text: &str, cues: Vec<DetectedCue>) -> Grouping {
        let lower = text.to_lowercase();
        let mut grouping = Grouping::default();
        let mut operations = Vec::new();
        let mut sources = Vec::new();
        let mut returns = Vec::new();
        let mut params = Vec::new();

        for cue in cues {
            match cue.category() {
                Category::Operation => operations.push(cue),
                Category::Source => sources.push(cue),
                Category::ReturnType => returns.push(cue),
                Category::Parameter => params.push(cue),
                Category::ControlFlow => grouping.control.push(cue),
                Category::Modifier => grouping.modifiers.push(cue),
                Category::ErrorHandling => grouping.errors.push(cue),
                Category::TypeConstraint => grouping.types.push(cue),
            }
        }
        // Stable: equal offsets keep detector order
        for cues in [
            &mut operations,
            &mut sources,
            &mut returns,
            &mut params,
            &mut grouping.control,
            &mut grouping.modifiers,
            &mut grouping.errors,
            &mut grouping.types,
        ] {
            cues.sort_by_key(|c| c.offset);
        }

        let retry_at = grouping
            .errors
            .iter()
            .find(|c| c.token.subtype() == "retry")
            .map(|c| c.offset);
        if let Some(retry_at) = retry_at {
            if let Some(i) = params
                .iter()
                .position(|p| p.token.subtype() == "times" && p.offset > retry_at)
            {
                grouping.retry_times = Some(params.remove(i));
            }
        }

        if operations.is_empty() {
            let mut orphans: Vec<DetectedCue> =
                sources.into_iter().chain(params).chain(returns).collect();
            orphans.sort_by_key(|c| c.offset);
            tracing::debug!(orphans = orphans.len(), "no operation detected");
            grouping.orphans = orphans;
            return grouping;
        }

        let mut groups: Vec<OperationGroup> = operations.iter().map(OperationGroup::new).collect();
        let spans = Spans::new(&operations, lower.len());

        claim_sources(&mut groups, &sources, &spans);
        self.claim_returns(&lower, &mut groups, &operations, &returns, &spans);

        for param in &params {
            let i = spans.index_of(param.offset).unwrap_or(0);
            groups[i].params.push(param.token.clone());
        }

        tracing::debug!(groups = groups.len(), "grouped operations");
        grouping.groups = groups;
        grouping
    }

    fn claim_returns(
        &self,
        lower: &str,
        groups: &mut [OperationGroup],
        operations: &[DetectedCue],
        returns: &[DetectedCue],
        spans: &Spans,
    ) {
        let mut claimed = vec![false; returns.len()];

        for (i, op) in operations.iter().enumerate() {
            let Some(window) = self.to_window(lower, op) else {
                continue;
            };
            for (j, ret) in returns.iter().enumerate() {
                if !claimed[j] && window.contains(&ret.offset) {
                    groups[i].add_return(&ret.token);
                    claimed[j] = true;
                }
            }
        }

        for (j, ret) in returns.iter().enumerate() {
            if claimed[j] {
                continue;
            }
            if let Some(i) = spans.index_of(ret.offset) {
                groups[i].add_return(&ret.token);
                claimed[j] = true;
            }
        }

        // Never dropped
        if let Some(last) = groups.last_mut() {
            for (j, ret) in returns.iter().enumerate() {
                if !claimed[j] {
                    last.add_return(&ret.token);
                }
            }
        }
    }

    /// Offsets covered by "<op> to ..."
    fn to_window(&self, lower: &str, op: &DetectedCue) -> Option<std::ops::Range<usize>> {
        let after = lower.get(op.end()..)?;
        let trimmed = after.trim_start();
        if !trimmed.starts_with("to ") {
            return None;
        }
        let start = op.end() + (after.len() - trimmed.len()) + "to ".len();
        Some(start..start.saturating_add(self.return_lookahead))
    }
}

/// Operation spans: `[op_i, op_{i+1})`, the last running to end of text
struct Spans {
    starts: Vec<usize>,
    end: usize,
}

impl Spans {
    fn new(operations: &[DetectedCue], text_len: usize) -> Self {
        Self {
            starts: operations.iter().map(|c| c.offset).collect(),
            end: text_len,
        }
    }

    fn range(&self, i: usize) -> std::ops::Range<usize> {
        let end = self.starts.get(i + 1).copied().unwrap_or(self.end.max(self.starts[i] + 1));
        self.starts[i]..end
    }

    /// Group whose span contains `offset`; `None` before the first operation
    fn index_of(&self, offset: usize) -> Option<usize> {
        (0..self.starts.len()).rev().find(|&i| self.starts[i] <= offset)
    }
}

fn claim_sources(groups: &mut [OperationGroup], sources: &[DetectedCue], spans: &Spans) {
    let mut claimed = vec![false; sources.len()];

    if let (Some(first), Some(group)) = (sources.first(), groups.first_mut()) {
        group.source = Some(first.token.clone());
        claimed[0] = true;
    }

    for i in 1..groups.len() {
        let (prev, current) = (spans.starts[i - 1], spans.starts[i]);
        // Nearest to the operation; the first in detector order on a tie
        let mut nearest: Option<usize> = None;
        for (j, src) in sources.iter().enumerate() {
            let between = prev < src.offset && src.offset < current;
            if !claimed[j] && between && nearest.map_or(true, |n| src.offset > sources[n].offset) {
                nearest = Some(j);
            }
        }
        if let Some(j) = nearest {
            groups[i].source = Some(sources[j].token.clone());
            claimed[j] = true;
        }
    }

    for (j, src) in sources.iter().enumerate() {
        if claimed[j] {
            continue;
        }
        match (0..groups.len()).find(|&i| spans.range(i).contains(&src.offset)) {
            Some(i) if groups[i].source.is_none() => {
                groups[i].source = Some(src.token.clone());
            }
            _ => tracing::trace!(source = %src.token, "source left unattached"),
        }
    }
}
