use super::*;

fn single_step(selector: &str) -> Step {
    let list = SelectorList::parse(selector).expect("selector should parse");
    assert_eq!(list.groups().len(), 1);
    assert_eq!(list.groups()[0].len(), 1);
    list.groups()[0][0].step.clone()
}

#[test]
fn parses_tag_with_attribute_equality() {
    let step = single_step(r#"form[data-autosave="true"]"#);
    assert_eq!(step.tag.as_deref(), Some("form"));
    assert_eq!(
        step.attrs,
        vec![AttrCondition::Equals { name: "data-autosave".into(), value: "true".into() }]
    );
}

#[test]
fn parses_groups_with_ids_and_classes() {
    let list = SelectorList::parse(".data-table, #ropaTable, #auditTable").expect("parse");
    let groups = list.groups();
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0][0].step.classes, vec!["data-table".to_string()]);
    assert_eq!(groups[1][0].step.id.as_deref(), Some("ropaTable"));
    assert_eq!(groups[2][0].step.id.as_deref(), Some("auditTable"));
}

#[test]
fn parses_descendant_and_child_combinators() {
    let list = SelectorList::parse("thead > tr th").expect("parse");
    let chain = &list.groups()[0];
    assert_eq!(chain.len(), 3);
    assert_eq!(chain[0].combinator, None);
    assert_eq!(chain[1].combinator, Some(Combinator::Child));
    assert_eq!(chain[2].combinator, Some(Combinator::Descendant));
}

#[test]
fn quoted_attribute_values_may_contain_commas_and_spaces() {
    let list = SelectorList::parse(r#"a[title="a, b c"], p"#).expect("parse");
    assert_eq!(list.groups().len(), 2);
    assert_eq!(
        list.groups()[0][0].step.attrs,
        vec![AttrCondition::Equals { name: "title".into(), value: "a, b c".into() }]
    );
}

#[test]
fn parses_substring_and_pseudo_conditions() {
    let step = single_step(r#"input[name^="data"][href*=delete]:checked"#);
    assert_eq!(step.attrs.len(), 2);
    assert!(matches!(step.attrs[0], AttrCondition::StartsWith { .. }));
    assert!(matches!(step.attrs[1], AttrCondition::Contains { .. }));
    assert_eq!(step.pseudo, vec![Pseudo::Checked]);
}

#[test]
fn attribute_condition_matching() {
    let contains = AttrCondition::Contains { name: "href".into(), value: "delete".into() };
    assert!(contains.matches(Some("/records/4/delete")));
    assert!(!contains.matches(Some("/records/4/edit")));
    assert!(!contains.matches(None));

    let includes = AttrCondition::Includes { name: "class".into(), value: "btn".into() };
    assert!(includes.matches(Some("btn btn-primary")));
    assert!(!includes.matches(Some("btn-primary")));

    let empty_prefix = AttrCondition::StartsWith { name: "x".into(), value: String::new() };
    assert!(!empty_prefix.matches(Some("anything")));
}

#[test]
fn rejects_unsupported_syntax() {
    for bad in ["", "a + b", "div ~ p", "li:nth-child(2)", "[unclosed", "a,", "> a"] {
        assert!(
            matches!(SelectorList::parse(bad), Err(DomError::UnsupportedSelector(_))),
            "expected {bad:?} to be rejected"
        );
    }
}

#[test]
fn from_str_delegates_to_parse() {
    let list: SelectorList = "tbody tr".parse().expect("parse");
    assert_eq!(list.groups()[0].len(), 2);
}
