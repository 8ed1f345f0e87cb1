use super::*;
use crate::ident::RenderContext;

fn ctx() -> RenderContext<'static> {
    RenderContext::new("p_", "p_users")
}

#[test]
fn test_operator_parsing() {
    assert_eq!("=".parse::<Operator>().unwrap(), Operator::Eq);
    assert_eq!("not   in".parse::<Operator>().unwrap(), Operator::NotIn);
    assert_eq!("Not Like".parse::<Operator>().unwrap(), Operator::NotLike);
    assert_eq!("<>".parse::<Operator>().unwrap(), Operator::LtGt);
    assert!("===".parse::<Operator>().unwrap_err().is_invalid_argument());
    assert!("ILIKE".parse::<Operator>().is_err());
}

#[test]
fn test_where_single_value() {
    let mut keys = KeyGen::new();
    let w = WhereClause::new("id", Operator::Eq, 1, Connector::Plain, &mut keys).unwrap();
    assert_eq!(w.render(&ctx()), "id = :id_1");
    assert_eq!(w.bindings().get("id_1"), Some(&Literal::Int(1)));
}

#[test]
fn test_where_multi_value_expands_to_or() {
    let mut keys = KeyGen::new();
    let w = WhereClause::new("id", Operator::Eq, vec![1, 2, 3], Connector::Plain, &mut keys)
        .unwrap();
    assert_eq!(
        w.render(&ctx()),
        "(id = :id_1 OR id = :id_2 OR id = :id_3)"
    );
    assert_eq!(w.bindings().len(), 3);
}

#[test]
fn test_where_in_list() {
    let mut keys = KeyGen::new();
    let w = WhereClause::new("id", Operator::In, vec![1, 2], Connector::Plain, &mut keys).unwrap();
    assert_eq!(w.render(&ctx()), "id IN (:id_1, :id_2)");

    let w = WhereClause::new("id", Operator::NotIn, 9, Connector::Plain, &mut keys).unwrap();
    assert_eq!(w.render(&ctx()), "id NOT IN (:id_3)");
}

#[test]
fn test_where_empty_in_list() {
    let mut keys = KeyGen::new();
    let empty: Vec<i64> = Vec::new();
    let w = WhereClause::new("id", Operator::In, empty.clone(), Connector::Plain, &mut keys)
        .unwrap();
    assert_eq!(w.render(&ctx()), "1=0");
    assert!(w.bindings().is_empty());
    let w = WhereClause::new("id", Operator::NotIn, empty.clone(), Connector::Plain, &mut keys)
        .unwrap();
    assert_eq!(w.render(&ctx()), "1=1");
    assert!(WhereClause::new("id", Operator::Eq, empty, Connector::Plain, &mut keys).is_err());
}

#[test]
fn test_where_between() {
    let mut keys = KeyGen::new();
    let w = WhereClause::new("age", Operator::Between, vec![18, 30], Connector::And, &mut keys)
        .unwrap();
    assert_eq!(w.render(&ctx()), "age BETWEEN :age_1 AND :age_2");
    assert!(
        WhereClause::new("age", Operator::Between, vec![1, 2, 3], Connector::And, &mut keys)
            .unwrap_err()
            .is_invalid_argument()
    );
    assert!(WhereClause::new("age", Operator::Between, 1, Connector::And, &mut keys).is_err());
}

#[test]
fn test_where_null_comparisons() {
    let mut keys = KeyGen::new();
    let w = WhereClause::new("deleted_at", Operator::Eq, Literal::Null, Connector::Plain, &mut keys)
        .unwrap();
    assert_eq!(w.render(&ctx()), "deleted_at IS NULL");
    let w = WhereClause::new("deleted_at", Operator::Ne, None::<i64>, Connector::And, &mut keys)
        .unwrap();
    assert_eq!(w.render(&ctx()), "deleted_at IS NOT NULL");
    assert!(w.bindings().is_empty());
}

#[test]
fn test_where_qualified_column_is_prefixed() {
    let mut keys = KeyGen::new();
    let w = WhereClause::new("posts.title", Operator::Like, "%rust%", Connector::Plain, &mut keys)
        .unwrap();
    assert_eq!(w.render(&ctx()), "p_posts.title LIKE :posts_title_1");
    let w = WhereClause::new("id", Operator::Gt, 5, Connector::And, &mut keys).unwrap();
    assert_eq!(w.render(&ctx().qualify_bare(true)), "p_users.id > :id_1");
}

#[test]
fn test_join_kinds() {
    assert_eq!("inner".parse::<JoinKind>().unwrap(), JoinKind::Inner);
    assert_eq!("LEFT OUTER JOIN".parse::<JoinKind>().unwrap(), JoinKind::LeftOuter);
    assert_eq!("right_outer".parse::<JoinKind>().unwrap(), JoinKind::RightOuter);
    assert_eq!("full outer".parse::<JoinKind>().unwrap(), JoinKind::FullOuter);
    assert!("cross".parse::<JoinKind>().unwrap_err().is_invalid_argument());
    assert!("outer".parse::<JoinKind>().is_err());
}

#[test]
fn test_join_render_qualifies_both_sides() {
    let join = JoinClause::new(JoinKind::Left, "Posts", "p_", [("id", "user_id")]).unwrap();
    assert_eq!(join.table(), "p_posts");
    assert_eq!(
        join.render(&ctx()),
        "LEFT JOIN p_posts ON p_users.id = p_posts.user_id"
    );

    let join = JoinClause::new(
        JoinKind::Inner,
        "tags",
        "p_",
        [("users.id", "tags(user_id)"), ("org_id", "org_id")],
    )
    .unwrap();
    assert_eq!(
        join.render(&ctx()),
        "INNER JOIN p_tags ON p_users.id = p_tags.user_id AND p_users.org_id = p_tags.org_id"
    );
}

#[test]
fn test_join_requires_comparison() {
    let on: [(&str, &str); 0] = [];
    assert!(JoinClause::new(JoinKind::Inner, "tags", "", on).is_err());
    assert!(JoinClause::new(JoinKind::Inner, "tags", "", [("*", "id")]).is_err());
}

#[test]
fn test_select_variants() {
    let flat = SelectClause::columns("id, users.name").unwrap();
    assert_eq!(flat.render(&ctx()), "id, p_users.name");

    let per_table =
        SelectClause::per_table([("users", vec!["id", "name"]), ("posts", vec!["title"])])
            .unwrap();
    assert_eq!(
        per_table.render(&ctx()),
        "p_users.id, p_users.name, p_posts.title"
    );

    let count = SelectClause::aggregate(AggregateFn::Count, None, false).unwrap();
    assert_eq!(count.render(&ctx()), "COUNT(*)");
    let distinct = SelectClause::aggregate(AggregateFn::Count, Some("email"), true).unwrap();
    assert_eq!(distinct.render(&ctx()), "COUNT(DISTINCT email)");
    let sum = SelectClause::aggregate(AggregateFn::Sum, Some("total"), false).unwrap();
    assert_eq!(sum.render(&ctx()), "SUM(total)");
    assert!(SelectClause::aggregate(AggregateFn::Sum, None, false).is_err());
}

#[test]
fn test_select_rejects_bad_identifiers() {
    assert!(SelectClause::columns("id; DROP TABLE users").is_err());
    assert!(SelectClause::per_table([("users", vec!["posts.id"])]).is_err());
}

#[test]
fn test_order_by() {
    assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
    assert!("down".parse::<SortDirection>().unwrap_err().is_invalid_argument());

    let order = OrderByClause::new("name, users.created_at", SortDirection::Desc).unwrap();
    assert_eq!(order.render(&ctx()), "ORDER BY name, p_users.created_at DESC");
}

#[test]
fn test_group_by_and_group_concat() {
    let group = GroupByClause::new(["users.id", "name"]).unwrap();
    assert_eq!(group.render(&ctx()), "GROUP BY p_users.id, name");

    let concat = GroupConcatClause::new("tags.name", Some("tag_names"), true).unwrap();
    assert_eq!(
        concat.render(&ctx()),
        "GROUP_CONCAT(DISTINCT p_tags.name) AS tag_names"
    );
    let concat = GroupConcatClause::new("name", None, false).unwrap();
    assert_eq!(concat.render(&ctx()), "GROUP_CONCAT(name)");
    assert!(GroupConcatClause::new("name", Some("bad alias"), false).is_err());
}

#[test]
fn test_limit() {
    assert_eq!(LimitClause::new(10).render(), "LIMIT 10");
    assert_eq!(LimitClause::with_offset(20, 10).render(), "LIMIT 20, 10");
}

#[test]
fn test_values_keep_order_and_serialize_arrays() {
    let mut keys = KeyGen::new();
    let values = ValuesClause::new(
        [
            ("username", Literal::text("x")),
            ("tags", Literal::from(vec!["a", "b"])),
        ],
        &mut keys,
    )
    .unwrap();
    assert_eq!(
        values.render(),
        "(username, tags) VALUES (:username_1, :tags_1)"
    );
    assert_eq!(
        values.bindings().get("tags_1"),
        Some(&Literal::text(r#"["a","b"]"#))
    );
}

#[test]
fn test_values_reject_duplicates_and_empty() {
    let mut keys = KeyGen::new();
    assert!(ValuesClause::new([("a", 1), ("a", 2)], &mut keys).is_err());
    let none: [(&str, i64); 0] = [];
    assert!(ValuesClause::new(none, &mut keys).is_err());
}

#[test]
fn test_set_shares_keygen_with_where() {
    let mut keys = KeyGen::new();
    let set = SetClause::new([("id", 2)], &mut keys).unwrap();
    let w = WhereClause::new("id", Operator::Eq, 1, Connector::Plain, &mut keys).unwrap();
    assert_eq!(set.render(), "SET id = :id_1");
    assert_eq!(w.render(&ctx()), "id = :id_2");
}

#[test]
fn test_create_table_dialects() {
    let def = TableDefinition::new(
        "p_users",
        [
            ("id", "INT"),
            ("username", "VARCHAR(255) | NOT NULL"),
            ("bio", "TEXT"),
        ],
    )
    .unwrap();
    assert_eq!(
        def.render_create(Dialect::MySql),
        "CREATE TABLE IF NOT EXISTS p_users (id INT(11) NOT NULL AUTO_INCREMENT, \
         username VARCHAR(255) NOT NULL, bio TEXT, PRIMARY KEY (id)) \
         ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
    );
    assert_eq!(
        def.render_create(Dialect::Sqlite),
        "CREATE TABLE IF NOT EXISTS p_users (id INTEGER PRIMARY KEY AUTOINCREMENT, \
         username VARCHAR(255) NOT NULL, bio TEXT)"
    );
}

#[test]
fn test_drop_and_truncate_dialects() {
    let def = TableDefinition::named("p_users");
    assert_eq!(def.render_drop(), "DROP TABLE IF EXISTS p_users");
    assert_eq!(def.render_truncate(Dialect::MySql), "TRUNCATE TABLE p_users");
    assert_eq!(def.render_truncate(Dialect::Sqlite), "DELETE FROM p_users");
}

#[test]
fn test_table_definition_rejects_bad_types() {
    assert!(TableDefinition::new("t", [("a", "INT; DROP TABLE x")]).is_err());
    assert!(TableDefinition::new("t", [("a", " | ")]).is_err());
    assert!(TableDefinition::new("t", [("bad name", "INT")]).is_err());
}
