//! SQL Query Normalizer
//!
//! Rewrites a tokenized query so every placeholder is a unique `:name`, and
//! flattens the caller's parameters into one ordered map keyed by those names.
//!
//! - `?` becomes `:param_N`, with `N` counted across the whole query.
//! - `:name` bound to an array becomes `:name_1, :name_2, ...`; repeated
//!   occurrences keep counting where the previous one stopped.
//! - `:name` bound to a single value stays as-is when it occurs once, and
//!   becomes `:name_1`, `:name_2`, ... in textual order when it repeats.

use std::collections::HashMap;

use indexmap::IndexMap;
use qbind_core::{NormalizeError, Parameters, PlaceholderRef, Value};

use super::{QueryTokenizer, ScanningTokenizer, Token};

/// Prefix used for placeholders generated from `?`.
const POSITIONAL_PREFIX: &str = "param";

/// A query rewritten to use only unique named placeholders.
///
/// Every `:name` in [`query`](Self::query) has exactly one entry in
/// [`parameters`](Self::parameters), and the map is ordered the way the
/// placeholders appear in the query.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuery {
    query: String,
    parameters: IndexMap<String, Value>,
}

impl NormalizedQuery {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn parameters(&self) -> &IndexMap<String, Value> {
        &self.parameters
    }

    /// Placeholder names in binding order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    pub fn into_parts(self) -> (String, IndexMap<String, Value>) {
        (self.query, self.parameters)
    }
}

/// Normalizes a query against its parameters.
pub trait QueryNormalizer: Send + Sync {
    fn normalize(
        &self,
        query: &str,
        parameters: &Parameters,
    ) -> Result<NormalizedQuery, NormalizeError>;
}

/// The default normalizer, generic over the tokenizer it uses.
#[derive(Debug, Clone, Default)]
pub struct DefaultNormalizer<T = ScanningTokenizer> {
    tokenizer: T,
}

impl<T: QueryTokenizer> DefaultNormalizer<T> {
    pub fn new(tokenizer: T) -> Self {
        Self { tokenizer }
    }
}

impl<T: QueryTokenizer> QueryNormalizer for DefaultNormalizer<T> {
    fn normalize(
        &self,
        query: &str,
        parameters: &Parameters,
    ) -> Result<NormalizedQuery, NormalizeError> {
        let tokens = self.tokenizer.tokenize(query);
        Session::new(&tokens, parameters, query.len()).run(&tokens)
    }
}

/// Normalizes a query with the default tokenizer.
///
/// # Example
///
/// ```
/// use qbind_core::{Parameters, Value};
/// use qbind_query::parameters::normalize;
///
/// let params = Parameters::positional([
///     Value::from("John"),
///     Value::from(vec![1i64, 2, 3]),
///     Value::from(25i64),
/// ]);
/// let normalized = normalize("name = ? AND id IN (?) AND age > ?", &params).unwrap();
///
/// assert_eq!(
///     normalized.query(),
///     "name = :param_1 AND id IN (:param_2, :param_3, :param_4) AND age > :param_5"
/// );
/// ```
pub fn normalize(query: &str, parameters: &Parameters) -> Result<NormalizedQuery, NormalizeError> {
    DefaultNormalizer::<ScanningTokenizer>::default().normalize(query, parameters)
}

/// Working state for a single normalization pass.
struct Session<'q, 'p> {
    parameters: &'p Parameters,
    /// How many times each name occurs in the whole query.
    name_counts: HashMap<&'q str, usize>,
    /// Next positional input to consume.
    positional_cursor: usize,
    /// Last suffix handed out to a `:param_N` placeholder.
    positional_counter: usize,
    /// Named tokens visited so far, per name.
    named_occurrences: HashMap<&'q str, usize>,
    /// Last suffix handed out by array expansion, per name.
    named_array_offsets: HashMap<&'q str, usize>,
    query: String,
    output: IndexMap<String, Value>,
}

impl<'q, 'p> Session<'q, 'p> {
    fn new(tokens: &[Token<'q>], parameters: &'p Parameters, capacity: usize) -> Self {
        let mut name_counts = HashMap::new();
        for name in tokens.iter().filter_map(Token::name) {
            *name_counts.entry(name).or_insert(0) += 1;
        }

        Self {
            parameters,
            name_counts,
            positional_cursor: 0,
            positional_counter: 0,
            named_occurrences: HashMap::new(),
            named_array_offsets: HashMap::new(),
            query: String::with_capacity(capacity),
            output: IndexMap::new(),
        }
    }

    fn run(mut self, tokens: &[Token<'q>]) -> Result<NormalizedQuery, NormalizeError> {
        for token in tokens {
            match *token {
                Token::Text(raw) => self.query.push_str(raw),
                Token::Positional => self.positional()?,
                Token::Named(raw) => {
                    let name = token.name().unwrap_or(raw);
                    self.named(raw, name)?;
                }
            }
        }

        tracing::trace!(placeholders = self.output.len(), "query normalized");

        Ok(NormalizedQuery {
            query: self.query,
            parameters: self.output,
        })
    }

    fn positional(&mut self) -> Result<(), NormalizeError> {
        let index = self.positional_cursor;
        let placeholder = PlaceholderRef::Positional(index);
        let parameters = self.parameters;
        let value = parameters
            .get_position(index)
            .ok_or_else(|| NormalizeError::MissingParameter(placeholder.clone()))?;
        self.positional_cursor += 1;

        match value {
            Value::Array(values) => {
                self.positional_counter = self.expand(
                    POSITIONAL_PREFIX,
                    values,
                    self.positional_counter,
                    &placeholder,
                )?;
            }
            scalar => {
                self.positional_counter += 1;
                let name = format!("{}_{}", POSITIONAL_PREFIX, self.positional_counter);
                self.emit(name, scalar.clone())?;
            }
        }

        Ok(())
    }

    fn named(&mut self, raw: &'q str, name: &'q str) -> Result<(), NormalizeError> {
        let parameters = self.parameters;
        let value = parameters
            .get_named(name)
            .ok_or_else(|| NormalizeError::MissingParameter(PlaceholderRef::named(name)))?;

        let occurrence = self.named_occurrences.entry(name).or_insert(0);
        *occurrence += 1;
        let occurrence = *occurrence;

        match value {
            Value::Array(values) => {
                let offset = self.named_array_offsets.get(name).copied().unwrap_or(0);
                let offset = self.expand(name, values, offset, &PlaceholderRef::named(name))?;
                self.named_array_offsets.insert(name, offset);
            }
            scalar if self.name_counts.get(name).copied().unwrap_or(0) > 1 => {
                self.emit(format!("{}_{}", name, occurrence), scalar.clone())?;
            }
            scalar => {
                self.query.push_str(raw);
                self.insert(name.to_string(), scalar.clone())?;
            }
        }

        Ok(())
    }

    /// Writes `:{prefix}_{offset+1}, ...` for every element and returns the
    /// new offset.
    fn expand(
        &mut self,
        prefix: &str,
        values: &[Value],
        mut offset: usize,
        placeholder: &PlaceholderRef,
    ) -> Result<usize, NormalizeError> {
        if values.is_empty() {
            return Err(NormalizeError::EmptyExpansion(placeholder.clone()));
        }
        if let Some(index) = values.iter().position(|value| !value.is_scalar()) {
            return Err(NormalizeError::NonScalarElement {
                placeholder: placeholder.clone(),
                index,
            });
        }

        tracing::trace!(
            placeholder = %placeholder,
            elements = values.len(),
            "expanding array parameter"
        );

        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.query.push_str(", ");
            }
            offset += 1;
            self.emit(format!("{}_{}", prefix, offset), value.clone())?;
        }

        Ok(offset)
    }

    /// Writes `:{name}` to the query and records its value.
    fn emit(&mut self, name: String, value: Value) -> Result<(), NormalizeError> {
        self.query.push(':');
        self.query.push_str(&name);
        self.insert(name, value)
    }

    fn insert(&mut self, name: String, value: Value) -> Result<(), NormalizeError> {
        if self.output.contains_key(&name) {
            return Err(NormalizeError::ParameterCollision(name));
        }
        self.output.insert(name, value);
        Ok(())
    }
}
