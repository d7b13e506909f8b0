//! Tests for placeholder tokenization and query normalization

use indoc::indoc;
use pretty_assertions::assert_eq;
use rstest::rstest;

use qbind_core::{NormalizeError, Parameters, PlaceholderRef, Value};

use super::{
    DefaultNormalizer, QueryNormalizer, QueryTokenizer, ScanningTokenizer, Token, TokenKind,
    normalize, tokenize,
};

fn kinds(query: &str) -> Vec<TokenKind> {
    tokenize(query).iter().map(Token::kind).collect()
}

fn named_tokens(query: &str) -> Vec<&str> {
    tokenize(query).into_iter().filter_map(|t| t.name()).collect()
}

fn reassemble(query: &str) -> String {
    tokenize(query).iter().map(Token::raw).collect()
}

fn entries(params: &indexmap::IndexMap<String, Value>) -> Vec<(&str, &Value)> {
    params.iter().map(|(k, v)| (k.as_str(), v)).collect()
}

// =============================================================================
// Tokenizer Tests
// =============================================================================

#[test]
fn test_tokenize_empty_query() {
    assert!(tokenize("").is_empty());
}

#[test]
fn test_tokenize_named_and_positional() {
    let tokens = tokenize("SELECT * FROM users WHERE id = :id AND status = ?");

    assert_eq!(
        tokens,
        vec![
            Token::Text("SELECT * FROM users WHERE id = "),
            Token::Named(":id"),
            Token::Text(" AND status = "),
            Token::Positional,
        ]
    );
}

#[test]
fn test_tokenize_adjacent_placeholders() {
    let tokens = tokenize("??:a:b");

    assert_eq!(
        tokens,
        vec![
            Token::Positional,
            Token::Positional,
            Token::Named(":a"),
            Token::Named(":b"),
        ]
    );
}

#[rstest]
#[case::plain("'hello'")]
#[case::empty_single("''")]
#[case::empty_double("\"\"")]
#[case::doubled_quote("'it''s'")]
#[case::backslash_quote("'O\\'Brien'")]
#[case::escaped_backslash("'C:\\\\'")]
#[case::placeholders_inside("':name ? :other'")]
#[case::other_quote_inside("'say \"hi\" ?'")]
#[case::double_quoted_identifier("\"weird:col?\"")]
#[case::double_quoted_doubled("\"a\"\"b:c\"")]
#[case::multiline("'line one\n:still_text'")]
fn test_tokenize_quoted_literal_is_single_text_token(#[case] literal: &str) {
    assert_eq!(tokenize(literal), vec![Token::Text(literal)]);
}

#[test]
fn test_tokenize_literal_then_placeholder() {
    let tokens = tokenize("name = 'O''Brien' AND id = :id");

    assert_eq!(
        tokens,
        vec![
            Token::Text("name = "),
            Token::Text("'O''Brien'"),
            Token::Text(" AND id = "),
            Token::Named(":id"),
        ]
    );
}

#[rstest]
#[case::single_cast("SELECT value::text FROM t")]
#[case::cast_chain("SELECT a::int::text FROM t")]
#[case::triple_colon("SELECT a:::b")]
fn test_tokenize_casts_produce_no_named_tokens(#[case] query: &str) {
    assert!(named_tokens(query).is_empty());
    assert_eq!(reassemble(query), query);
}

#[test]
fn test_tokenize_placeholder_followed_by_cast() {
    let tokens = tokenize(":id::int");

    assert_eq!(
        tokens,
        vec![Token::Named(":id"), Token::Text(":"), Token::Text(":"), Token::Text("int")]
    );
}

#[test]
fn test_tokenize_casts_next_to_placeholders() {
    let query = "SELECT :a, b::int, ?::text, :c";

    assert_eq!(named_tokens(query), vec!["a", "c"]);
    assert_eq!(
        kinds(query)
            .into_iter()
            .filter(|k| *k == TokenKind::Positional)
            .count(),
        1
    );
}

#[rstest]
#[case::digit(":1abc")]
#[case::trailing(":")]
#[case::space(": x")]
#[case::dash(":-x")]
fn test_tokenize_lone_colon_is_text(#[case] query: &str) {
    let tokens = tokenize(query);

    assert_eq!(tokens[0], Token::Text(":"));
    assert!(tokens.iter().all(|t| t.kind() == TokenKind::Text));
}

#[test]
fn test_tokenize_name_characters() {
    assert_eq!(named_tokens("x = :_private AND y = :field_2"), vec!["_private", "field_2"]);
}

#[test]
fn test_tokenize_unterminated_quote() {
    let tokens = tokenize("WHERE a = 'open AND b = :b");

    assert_eq!(
        tokens,
        vec![
            Token::Text("WHERE a = "),
            Token::Text("'"),
            Token::Text("open AND b = "),
            Token::Named(":b"),
        ]
    );
}

#[test]
fn test_tokenize_unterminated_after_doubled_quote_closes_at_last_pair() {
    let tokens = tokenize("'ab'' :c");

    assert_eq!(
        tokens,
        vec![Token::Text("'ab'"), Token::Text("'"), Token::Text(" "), Token::Named(":c")]
    );
}

#[test]
fn test_tokenize_trailing_backslash_in_literal() {
    let query = "'abc\\";
    let tokens = tokenize(query);

    assert_eq!(tokens, vec![Token::Text("'"), Token::Text("abc\\")]);
}

#[test]
fn test_tokenize_unicode_text() {
    let query = "SELECT '日本語 :no' AS ラベル, '🦀' WHERE name = :name AND note = ?";

    assert_eq!(named_tokens(query), vec!["name"]);
    assert_eq!(reassemble(query), query);
}

#[test]
fn test_tokenize_non_ascii_name_stays_text() {
    let tokens = tokenize("x = :café");

    assert_eq!(tokens, vec![Token::Text("x = "), Token::Text(":café")]);
}

#[test]
fn test_tokenize_preserves_whitespace() {
    let query = indoc! {"
        SELECT *
        \tFROM users
        WHERE id = :id
    "};

    assert_eq!(reassemble(query), query);
    assert_eq!(named_tokens(query), vec!["id"]);
}

#[rstest]
#[case("")]
#[case("SELECT 1")]
#[case("a = ? AND b = :b AND c = 'x''y' AND d = \"q\\\"r\"")]
#[case("'unterminated :x ? \"also")]
#[case("::::??''\"\"\\")]
#[case("ü:ö?ä'ß'")]
fn test_tokenize_round_trips(#[case] query: &str) {
    assert_eq!(reassemble(query), query);
}

#[test]
fn test_scanning_tokenizer_matches_free_function() {
    let query = "SELECT :a, ?";
    assert_eq!(ScanningTokenizer.tokenize(query), tokenize(query));
}

// =============================================================================
// Normalizer Tests
// =============================================================================

#[rstest]
#[case("SELECT 1")]
#[case("SELECT * FROM t WHERE s = ':not ?' AND c::text = 'x'")]
#[case("")]
fn test_normalize_without_placeholders_is_identity(#[case] query: &str) {
    let normalized = normalize(query, &Parameters::new()).unwrap();

    assert_eq!(normalized.query(), query);
    assert!(normalized.parameters().is_empty());
}

#[test]
fn test_normalize_unique_named_placeholders_unchanged() {
    let query = "SELECT * FROM users WHERE id = :id AND name = :name";
    let params = Parameters::new().bind("id", 42i64).bind("name", "Alice");

    let normalized = normalize(query, &params).unwrap();

    assert_eq!(normalized.query(), query);
    assert_eq!(
        entries(normalized.parameters()),
        vec![("id", &Value::Int64(42)), ("name", &Value::String("Alice".into()))]
    );
}

#[test]
fn test_normalize_parameter_order_follows_query_not_input() {
    let params = Parameters::new().bind("b", 2i64).bind("a", 1i64);

    let normalized = normalize("x = :a AND y = :b", &params).unwrap();

    assert_eq!(normalized.parameter_names().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn test_normalize_named_array_expansion() {
    let params = Parameters::new().bind("ids", vec![10i64, 20, 30]);

    let normalized = normalize("SELECT * FROM t WHERE id IN (:ids)", &params).unwrap();

    assert_eq!(
        normalized.query(),
        "SELECT * FROM t WHERE id IN (:ids_1, :ids_2, :ids_3)"
    );
    assert_eq!(
        entries(normalized.parameters()),
        vec![
            ("ids_1", &Value::Int64(10)),
            ("ids_2", &Value::Int64(20)),
            ("ids_3", &Value::Int64(30)),
        ]
    );
}

#[test]
fn test_normalize_repeated_named_array_continues_numbering() {
    let params = Parameters::new().bind("ids", vec![1i64, 2]);

    let normalized = normalize("a IN (:ids) OR b IN (:ids)", &params).unwrap();

    assert_eq!(normalized.query(), "a IN (:ids_1, :ids_2) OR b IN (:ids_3, :ids_4)");
    assert_eq!(
        normalized.parameter_names().collect::<Vec<_>>(),
        vec!["ids_1", "ids_2", "ids_3", "ids_4"]
    );
}

#[test]
fn test_normalize_duplicate_named_scalar_is_suffixed() {
    let params = Parameters::new().bind("x", "v");

    let normalized = normalize("a = :x OR b = :x OR c = :x", &params).unwrap();

    assert_eq!(normalized.query(), "a = :x_1 OR b = :x_2 OR c = :x_3");
    let v = Value::String("v".into());
    assert_eq!(
        entries(normalized.parameters()),
        vec![("x_1", &v), ("x_2", &v), ("x_3", &v)]
    );
}

#[test]
fn test_normalize_duplicates_only_affect_repeated_names() {
    let params = Parameters::new().bind("x", 1i64).bind("y", 2i64);

    let normalized = normalize(":x + :y + :x", &params).unwrap();

    assert_eq!(normalized.query(), ":x_1 + :y + :x_2");
    assert_eq!(
        normalized.parameter_names().collect::<Vec<_>>(),
        vec!["x_1", "y", "x_2"]
    );
}

#[test]
fn test_normalize_positional_to_named() {
    let params = Parameters::positional(["John", "Doe"]);

    let normalized = normalize("first = ? AND last = ?", &params).unwrap();

    assert_eq!(normalized.query(), "first = :param_1 AND last = :param_2");
    assert_eq!(
        entries(normalized.parameters()),
        vec![
            ("param_1", &Value::String("John".into())),
            ("param_2", &Value::String("Doe".into())),
        ]
    );
}

#[test]
fn test_normalize_positional_with_mixed_array_shares_counter() {
    let params = Parameters::positional([
        Value::from("John"),
        Value::from(vec![1i64, 2, 3]),
        Value::from(25i64),
    ]);

    let normalized = normalize("name = ? AND id IN (?) AND age > ?", &params).unwrap();

    assert_eq!(
        normalized.query(),
        "name = :param_1 AND id IN (:param_2, :param_3, :param_4) AND age > :param_5"
    );
    assert_eq!(
        entries(normalized.parameters()),
        vec![
            ("param_1", &Value::String("John".into())),
            ("param_2", &Value::Int64(1)),
            ("param_3", &Value::Int64(2)),
            ("param_4", &Value::Int64(3)),
            ("param_5", &Value::Int64(25)),
        ]
    );
}

#[test]
fn test_normalize_mixed_positional_and_named() {
    let params = Parameters::new()
        .push(7i64)
        .bind("status", "active")
        .push(vec!["a", "b"]);

    let normalized = normalize("id = ? AND status = :status AND tag IN (?)", &params).unwrap();

    assert_eq!(
        normalized.query(),
        "id = :param_1 AND status = :status AND tag IN (:param_2, :param_3)"
    );
    assert_eq!(
        normalized.parameter_names().collect::<Vec<_>>(),
        vec!["param_1", "status", "param_2", "param_3"]
    );
}

#[test]
fn test_normalize_null_scalar_is_bound() {
    let params = Parameters::new().bind("deleted_at", Value::Null);

    let normalized = normalize("deleted_at IS :deleted_at", &params).unwrap();

    assert_eq!(normalized.parameters().get("deleted_at"), Some(&Value::Null));
}

#[test]
fn test_normalize_ignores_placeholders_in_literals_and_casts() {
    let query = indoc! {r#"
        SELECT ':fake', "odd?col", 'it''s :x', 'O\'Brien ?'
        FROM t
        WHERE created::date = :day AND kind = ?
    "#};
    let params = Parameters::new().push("k").bind("day", "2024-01-01");

    let normalized = normalize(query, &params).unwrap();

    assert_eq!(
        normalized.query(),
        indoc! {r#"
            SELECT ':fake', "odd?col", 'it''s :x', 'O\'Brien ?'
            FROM t
            WHERE created::date = :day AND kind = :param_1
        "#}
    );
    assert_eq!(normalized.parameter_names().collect::<Vec<_>>(), vec!["day", "param_1"]);
}

#[test]
fn test_normalize_preserves_unicode_text() {
    let params = Parameters::new().bind("name", "Zoë");

    let normalized = normalize("SELECT '✓ :x' AS «mark» WHERE nom = :name -- ✓", &params).unwrap();

    assert_eq!(normalized.query(), "SELECT '✓ :x' AS «mark» WHERE nom = :name -- ✓");
}

#[test]
fn test_normalize_unused_parameters_are_dropped() {
    let params = Parameters::new().bind("id", 1i64).bind("unused", 2i64).push(3i64);

    let normalized = normalize("id = :id", &params).unwrap();

    assert_eq!(normalized.parameter_names().collect::<Vec<_>>(), vec!["id"]);
}

#[test]
fn test_default_normalizer_with_explicit_tokenizer() {
    let normalizer = DefaultNormalizer::new(ScanningTokenizer);
    let params = Parameters::positional([1i64]);

    let normalized = normalizer.normalize("id = ?", &params).unwrap();

    assert_eq!(normalized.query(), "id = :param_1");
}

#[test]
fn test_normalized_query_into_parts() {
    let params = Parameters::new().bind("id", 1i64);
    let (query, parameters) = normalize("id = :id", &params).unwrap().into_parts();

    assert_eq!(query, "id = :id");
    assert_eq!(parameters.len(), 1);
}

// =============================================================================
// Normalizer Error Tests
// =============================================================================

#[test]
fn test_missing_positional_parameter() {
    let params = Parameters::positional([1i64]);

    let err = normalize("a = ? AND b = ?", &params).unwrap_err();

    assert_eq!(err, NormalizeError::MissingParameter(PlaceholderRef::Positional(1)));
}

#[test]
fn test_missing_named_parameter() {
    let err = normalize("a = :a", &Parameters::new()).unwrap_err();

    assert_eq!(err, NormalizeError::MissingParameter(PlaceholderRef::named("a")));
}

#[test]
fn test_named_key_does_not_satisfy_positional() {
    let params = Parameters::new().bind("0", 1i64);

    let err = normalize("a = ?", &params).unwrap_err();

    assert_eq!(err, NormalizeError::MissingParameter(PlaceholderRef::Positional(0)));
}

#[test]
fn test_empty_named_array() {
    let params = Parameters::new().bind("ids", Value::Array(vec![]));

    let err = normalize("id IN (:ids)", &params).unwrap_err();

    assert_eq!(err, NormalizeError::EmptyExpansion(PlaceholderRef::named("ids")));
}

#[test]
fn test_empty_positional_array() {
    let params = Parameters::positional([Value::from(1i64), Value::Array(vec![])]);

    let err = normalize("a = ? AND b IN (?)", &params).unwrap_err();

    assert_eq!(err, NormalizeError::EmptyExpansion(PlaceholderRef::Positional(1)));
}

#[rstest]
#[case::nested_array(Value::Array(vec![Value::Int64(1)]))]
#[case::null(Value::Null)]
#[case::json(Value::Json(serde_json::json!({"a": 1})))]
fn test_non_scalar_array_element(#[case] element: Value) {
    let params = Parameters::new().bind("ids", Value::Array(vec![Value::Int64(1), element]));

    let err = normalize("id IN (:ids)", &params).unwrap_err();

    assert_eq!(
        err,
        NormalizeError::NonScalarElement {
            placeholder: PlaceholderRef::named("ids"),
            index: 1,
        }
    );
}

#[test]
fn test_non_scalar_positional_array_element() {
    let params = Parameters::positional([Value::Array(vec![Value::Array(vec![])])]);

    let err = normalize("id IN (?)", &params).unwrap_err();

    assert!(matches!(
        err,
        NormalizeError::NonScalarElement {
            placeholder: PlaceholderRef::Positional(0),
            index: 0,
        }
    ));
}

#[test]
fn test_first_error_wins() {
    let params = Parameters::new().bind("ids", Value::Array(vec![]));

    let err = normalize("a IN (:ids) AND b = :missing", &params).unwrap_err();

    assert!(matches!(err, NormalizeError::EmptyExpansion(_)));
}

#[test]
fn test_generated_name_collision_is_rejected() {
    let params = Parameters::new().push(1i64).bind("param_1", 2i64);

    let err = normalize("a = ? AND b = :param_1", &params).unwrap_err();

    assert_eq!(err, NormalizeError::ParameterCollision("param_1".into()));
}

#[test]
fn test_suffixed_name_collision_is_rejected() {
    let params = Parameters::new().bind("x", 1i64).bind("x_1", 2i64);

    let err = normalize(":x_1 OR :x OR :x", &params).unwrap_err();

    assert_eq!(err, NormalizeError::ParameterCollision("x_1".into()));
}
