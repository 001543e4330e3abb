use crate::value::Value;

/// Accumulated WHERE fragments, ordering, pagination and select modifiers.
///
/// `and_where` accumulates; every other setter overwrites.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    /// WHERE fragments (without parentheses or AND)
    where_conditions: Vec<String>,
    /// Arguments for the WHERE fragments, in call order
    params: Vec<Value>,
    order: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    /// Optimizer hint placed before SELECT
    hint: Option<String>,
    force_index: Option<String>,
    /// SELECT list (default `*`)
    fields: Option<String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a WHERE fragment with `?` placeholders.
    pub fn and_where<I, T>(&mut self, fragment: &str, args: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.where_conditions.push(fragment.to_string());
        self.params.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn order_by(&mut self, order: &str) -> &mut Self {
        self.order = Some(order.to_string());
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// e.g. `/*+TDDL:slave()*/`
    pub fn hint(&mut self, hint: &str) -> &mut Self {
        self.hint = Some(hint.to_string());
        self
    }

    pub fn force_index(&mut self, index: &str) -> &mut Self {
        self.force_index = Some(index.to_string());
        self
    }

    /// Raw SELECT list, e.g. `"id, name"`.
    pub fn select(&mut self, fields: &str) -> &mut Self {
        self.fields = Some(fields.to_string());
        self
    }

    pub fn has_where(&self) -> bool {
        !self.where_conditions.is_empty()
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// `WHERE (a) AND (b)`, or an empty string.
    pub fn where_clause(&self) -> String {
        if self.where_conditions.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .where_conditions
            .iter()
            .map(|c| format!("({c})"))
            .collect();
        format!("WHERE {}", parts.join(" AND "))
    }

    pub(crate) fn order_clause(&self) -> Option<String> {
        self.order.as_ref().map(|o| format!("ORDER BY {o}"))
    }

    pub(crate) fn limit_clause(&self) -> Option<String> {
        self.limit.map(|l| format!("LIMIT {l}"))
    }

    pub(crate) fn offset_clause(&self) -> Option<String> {
        self.offset.map(|o| format!("OFFSET {o}"))
    }

    pub(crate) fn force_index_clause(&self) -> Option<String> {
        self.force_index.as_ref().map(|i| format!("force index({i})"))
    }

    pub(crate) fn hint_prefix(&self) -> &str {
        self.hint.as_deref().unwrap_or("")
    }

    pub(crate) fn fields(&self) -> &str {
        self.fields.as_deref().unwrap_or("*")
    }
}
