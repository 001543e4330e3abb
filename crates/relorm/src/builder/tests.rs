use super::*;
use crate::dialect::{MySql, Postgres, Sqlite};
use crate::value::Value;
use std::collections::BTreeMap;

fn user_map() -> BTreeMap<String, Value> {
    let mut m = BTreeMap::new();
    m.insert("name".to_string(), Value::from("fifsky"));
    m.insert("id".to_string(), Value::from(1));
    m.insert("updated_at".to_string(), Value::from("2018-07-11 11:58:21"));
    m.insert("email".to_string(), Value::from("fifsky@gmail.com"));
    m.insert("created_at".to_string(), Value::from("2018-07-11 11:58:21"));
    m
}

#[test]
fn test_select_full_shape() {
    let mut f = FilterSpec::new();
    f.and_where("id = ?", [1]).order_by("id desc").limit(0).offset(10);
    let stmt = StatementBuilder::new(&MySql, "users").select(&f);
    assert_eq!(
        stmt.sql,
        "SELECT * FROM `users` WHERE (id = ?) ORDER BY id desc LIMIT 0 OFFSET 10;"
    );
    assert_eq!(stmt.args, vec![Value::Int(1)]);
}

#[test]
fn test_select_without_clauses() {
    let stmt = StatementBuilder::new(&MySql, "users").select(&FilterSpec::new());
    assert_eq!(stmt.sql, "SELECT * FROM `users`;");
    assert!(stmt.args.is_empty());
}

#[test]
fn test_select_force_index_hint_and_fields() {
    let mut f = FilterSpec::new();
    f.and_where("id = ?", [1])
        .force_index("idx_user")
        .hint("/*+TDDL:slave()*/")
        .select("id, name");
    let stmt = StatementBuilder::new(&MySql, "users").select(&f);
    assert_eq!(
        stmt.sql,
        "/*+TDDL:slave()*/SELECT id, name FROM `users` force index(idx_user) WHERE (id = ?);"
    );
}

#[test]
fn test_where_accumulates_in_order() {
    let mut f = FilterSpec::new();
    f.and_where("a = ?", [1])
        .and_where("b = ? OR c = ?", crate::args![2, "x"])
        .and_where("d IS NULL", crate::args![]);
    assert_eq!(f.where_clause(), "WHERE (a = ?) AND (b = ? OR c = ?) AND (d IS NULL)");
    assert_eq!(
        f.params(),
        &[Value::Int(1), Value::Int(2), Value::Text("x".into())]
    );
}

#[test]
fn test_setters_overwrite() {
    let mut f = FilterSpec::new();
    f.limit(5).limit(10).offset(1).offset(2).order_by("a").order_by("b");
    let stmt = StatementBuilder::new(&Postgres, "t").select(&f);
    assert_eq!(stmt.sql, "SELECT * FROM \"t\" ORDER BY b LIMIT 10 OFFSET 2;");
}

#[test]
fn test_same_filter_renders_identically() {
    let mut f = FilterSpec::new();
    f.and_where("x > ?", [3]).limit(2);
    let b = StatementBuilder::new(&MySql, "t");
    assert_eq!(b.select(&f), b.select(&f));
    assert_eq!(b.count(&f), b.count(&f));
}

#[test]
fn test_insert_sorted_columns() {
    let stmt = StatementBuilder::new(&MySql, "users").insert(&user_map());
    assert_eq!(
        stmt.sql,
        "INSERT INTO `users` (`created_at`,`email`,`id`,`name`,`updated_at`) VALUES(?,?,?,?,?);"
    );
    assert_eq!(stmt.args[1], Value::from("fifsky@gmail.com"));
    assert_eq!(stmt.args[2], Value::Int(1));
}

#[test]
fn test_insert_quoting_per_dialect() {
    let m = user_map();
    assert_eq!(
        StatementBuilder::new(&Postgres, "users").insert(&m).sql,
        r#"INSERT INTO "users" ("created_at","email","id","name","updated_at") VALUES(?,?,?,?,?);"#
    );
    assert_eq!(
        StatementBuilder::new(&Sqlite, "users").insert(&m).sql,
        r#"INSERT INTO "users" ("created_at","email","id","name","updated_at") VALUES(?,?,?,?,?);"#
    );
}

#[test]
fn test_update_set_args_precede_where_args() {
    let mut f = FilterSpec::new();
    f.and_where("id = ?", [1]);
    let mut set = BTreeMap::new();
    set.insert("name".to_string(), Assignment::value("fifsky"));
    set.insert("email".to_string(), Assignment::value("fifsky@gmail.com"));

    let stmt = StatementBuilder::new(&MySql, "users").update(&f, &set);
    assert_eq!(stmt.sql, "UPDATE `users` SET `email`=?,`name`=? WHERE (id = ?);");
    assert_eq!(
        stmt.args,
        vec![
            Value::from("fifsky@gmail.com"),
            Value::from("fifsky"),
            Value::Int(1)
        ]
    );
}

#[test]
fn test_update_with_expression() {
    let mut f = FilterSpec::new();
    f.and_where("id = ?", [7]);
    let mut set = BTreeMap::new();
    set.insert(
        "price".to_string(),
        Assignment::from(Expr::new("price * ? + ?", crate::args![2, 100])),
    );
    let stmt = StatementBuilder::new(&MySql, "goods").update(&f, &set);
    assert_eq!(stmt.sql, "UPDATE `goods` SET `price`=price * ? + ? WHERE (id = ?);");
    assert_eq!(stmt.args, crate::args![2, 100, 7]);
}

#[test]
fn test_delete_and_count() {
    let mut f = FilterSpec::new();
    f.and_where("id = ?", [1]);
    let b = StatementBuilder::new(&MySql, "users");
    assert_eq!(b.delete(&f).sql, "DELETE FROM `users` WHERE (id = ?);");
    assert_eq!(b.count(&f).sql, "SELECT count(*) FROM `users` WHERE (id = ?);");

    f.limit(3).offset(6);
    assert_eq!(
        b.count(&f).sql,
        "SELECT count(*) FROM `users` WHERE (id = ?) LIMIT 3 OFFSET 6;"
    );
}

#[test]
fn test_expand_list_args() {
    let (sql, args) = expand_list_args(
        "SELECT * FROM t WHERE id IN (?) AND name = ?",
        crate::args![Value::list([1, 2, 3]), "a"],
    )
    .unwrap();
    assert_eq!(sql, "SELECT * FROM t WHERE id IN (?, ?, ?) AND name = ?");
    assert_eq!(args, crate::args![1, 2, 3, "a"]);
}

#[test]
fn test_expand_skips_quoted_placeholders() {
    let (sql, args) = expand_list_args(
        "SELECT '?' AS q FROM t WHERE id IN (?)",
        crate::args![Value::list([5, 6])],
    )
    .unwrap();
    assert_eq!(sql, "SELECT '?' AS q FROM t WHERE id IN (?, ?)");
    assert_eq!(args.len(), 2);
}

#[test]
fn test_expand_rejects_empty_list_and_mismatch() {
    let empty = expand_list_args("x IN (?)", crate::args![Value::List(vec![])]);
    assert!(matches!(empty, Err(crate::OrmError::Validation(_))));

    let short = expand_list_args("a = ? AND b IN (?)", crate::args![Value::list([1])]);
    assert!(short.is_err());
}

#[test]
fn test_expand_without_lists_is_identity() {
    let (sql, args) = expand_list_args("a = ?", crate::args![1]).unwrap();
    assert_eq!(sql, "a = ?");
    assert_eq!(args, crate::args![1]);
}

#[test]
fn test_schema_qualified_table() {
    let mut f = FilterSpec::new();
    f.and_where("id = ?", [1]);
    let stmt = StatementBuilder::new(&MySql, "archive.users").select(&f);
    assert_eq!(stmt.sql, "SELECT * FROM `archive`.`users` WHERE (id = ?);");

    let stmt = StatementBuilder::new(&Postgres, "archive.users").delete(&f);
    assert_eq!(stmt.sql, "DELETE FROM \"archive\".\"users\" WHERE (id = ?);");
}
