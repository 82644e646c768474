use super::*;

// =============================================================
// Helpers
// =============================================================

fn doc(html: &str) -> Document {
    Document::parse(html).expect("fixture should parse")
}

fn by_id(doc: &Document, id: &str) -> NodeId {
    doc.element_by_id(id).unwrap_or_else(|| panic!("missing #{id}"))
}

const TABLE: &str = r#"
<div class="table-responsive">
  <table id="records" class="data-table">
    <thead><tr><th>Name</th><th class="no-sort">Actions</th></tr></thead>
    <tbody>
      <tr id="r1"><td>Alpha</td><td><a id="del" href="/records/1/delete"><i id="icon"></i>Delete</a></td></tr>
      <tr id="r2"><td>Beta</td><td></td></tr>
    </tbody>
  </table>
</div>"#;

// =============================================================
// Construction
// =============================================================

#[test]
fn new_document_has_an_empty_body() {
    let doc = Document::new();
    let body = doc.body().expect("body");
    assert_eq!(doc.tag_name(&body), "body");
    assert_eq!(doc.inner_html(&body), "");
}

#[test]
fn fragments_are_wrapped_in_a_body() {
    let doc = doc("<p id=\"a\">x</p>");
    let p = by_id(&doc, "a");
    assert_eq!(doc.parent(&p), doc.body());
}

#[test]
fn explicit_body_is_kept() {
    let doc = doc("<html><body class=\"page\"><p>x</p></body></html>");
    let body = doc.body().expect("body");
    assert!(doc.has_class(&body, "page"));
    assert_eq!(doc.query_all(None, "body").len(), 1);
}

// =============================================================
// Queries
// =============================================================

#[test]
fn query_all_returns_document_order() {
    let doc = doc(TABLE);
    let rows = doc.query_all(None, "tbody tr");
    assert_eq!(rows, vec![by_id(&doc, "r1"), by_id(&doc, "r2")]);
}

#[test]
fn descendant_matching_backtracks_over_ancestors() {
    let doc = doc(r#"<div class="x"><section><div><p id="p">t</p></div></section></div>"#);
    let p = by_id(&doc, "p");
    assert!(doc.matches(&p, ".x section > div p"));
    assert!(doc.matches(&p, "div > p"));
    assert!(!doc.matches(&p, "section > p"));
}

#[test]
fn scoped_queries_only_return_descendants() {
    let doc = doc(TABLE);
    let r1 = by_id(&doc, "r1");
    assert_eq!(doc.query_all(Some(&r1), "td").len(), 2);
    assert_eq!(doc.query_all(Some(&r1), "th").len(), 0);
}

#[test]
fn unsupported_selectors_match_nothing() {
    let doc = doc(TABLE);
    assert!(doc.query_all(None, "tr + tr").is_empty());
    let r1 = by_id(&doc, "r1");
    assert!(!doc.matches(&r1, "tr:nth-child(1)"));
}

#[test]
fn closest_walks_inclusive_ancestors() {
    let doc = doc(TABLE);
    let icon = by_id(&doc, "icon");
    assert_eq!(doc.closest(&icon, r#"a[href*="delete"]"#), Some(by_id(&doc, "del")));
    assert_eq!(doc.closest(&icon, "i"), Some(icon));
    assert_eq!(doc.closest(&icon, ".card-body"), None);
}

#[test]
fn element_by_id_ignores_detached_nodes() {
    let mut doc = doc(TABLE);
    let r2 = by_id(&doc, "r2");
    doc.remove(&r2);
    assert!(doc.element_by_id("r2").is_none());
    assert!(!doc.is_connected(&r2));
}

// =============================================================
// Attributes, classes, style
// =============================================================

#[test]
fn class_helpers_edit_the_class_attribute() {
    let mut doc = doc(TABLE);
    let table = by_id(&doc, "records");
    doc.add_class(&table, "sort-asc");
    doc.add_class(&table, "sort-asc");
    assert_eq!(doc.attr(&table, "class").as_deref(), Some("data-table sort-asc"));
    doc.remove_class(&table, "data-table");
    assert_eq!(doc.attr(&table, "class").as_deref(), Some("sort-asc"));
    assert!(doc.matches(&table, ".sort-asc"));
}

#[test]
fn inline_style_properties_are_merged_and_removed() {
    let mut doc = doc(r#"<tr id="r" style="color: red"></tr>"#);
    let row = by_id(&doc, "r");
    doc.set_style(&row, "display", "none");
    assert_eq!(doc.style(&row, "display").as_deref(), Some("none"));
    assert_eq!(doc.style(&row, "color").as_deref(), Some("red"));
    doc.set_style(&row, "display", "");
    assert_eq!(doc.style(&row, "display"), None);
    doc.set_style(&row, "color", "");
    assert_eq!(doc.attr(&row, "style"), None);
}

// =============================================================
// Content
// =============================================================

#[test]
fn text_content_concatenates_descendants() {
    let doc = doc(TABLE);
    let r1 = by_id(&doc, "r1");
    assert_eq!(doc.text_content(&r1), "AlphaDelete");
}

#[test]
fn inner_html_round_trips_markup() {
    let mut doc = doc(r#"<button id="b" type="submit"><i class="fas fa-save"></i>Save</button>"#);
    let button = by_id(&doc, "b");
    let original = doc.inner_html(&button);
    assert_eq!(original, r#"<i class="fas fa-save"></i>Save"#);

    doc.set_inner_html(&button, "Processing...");
    assert_eq!(doc.text_content(&button), "Processing...");

    doc.set_inner_html(&button, &original);
    assert_eq!(doc.inner_html(&button), original);
}

#[test]
fn set_text_content_replaces_children() {
    let mut doc = doc(TABLE);
    let r1 = by_id(&doc, "r1");
    doc.set_text_content(&r1, "plain");
    assert_eq!(doc.inner_html(&r1), "plain");
    assert!(doc.element_by_id("del").is_none());
}

#[test]
fn outer_html_escapes_text_and_attributes() {
    let mut doc = Document::new();
    let body = doc.body().expect("body");
    let span = doc.create_element("span").expect("span");
    doc.set_attr(&span, "title", "a \"b\"");
    doc.set_text_content(&span, "1 < 2");
    doc.append_child(&body, &span);
    assert_eq!(doc.outer_html(span), r#"<span title="a &quot;b&quot;">1 &lt; 2</span>"#);
}

// =============================================================
// Form controls
// =============================================================

#[test]
fn control_values_are_seeded_from_markup() {
    let doc = doc(
        r#"<form>
            <input id="t" name="title" value="Payroll">
            <textarea id="d" name="desc">Monthly run</textarea>
            <select id="s" name="basis"><option value="consent">Consent</option><option value="contract" selected>Contract</option></select>
            <input id="c" type="checkbox" name="active" checked>
        </form>"#,
    );
    assert_eq!(doc.value(&by_id(&doc, "t")), "Payroll");
    assert_eq!(doc.value(&by_id(&doc, "d")), "Monthly run");
    assert_eq!(doc.value(&by_id(&doc, "s")), "contract");
    assert_eq!(doc.value(&by_id(&doc, "c")), "on");
    assert!(doc.checked(&by_id(&doc, "c")));
}

#[test]
fn select_rejects_unknown_values() {
    let mut doc = doc(r#"<select id="s"><option>One</option><option>Two</option></select>"#);
    let select = by_id(&doc, "s");
    assert_eq!(doc.value(&select), "One");
    doc.set_value(&select, "Two");
    assert_eq!(doc.value(&select), "Two");
    doc.set_value(&select, "Three");
    assert_eq!(doc.value(&select), "");
}

#[test]
fn checking_a_radio_unchecks_its_group() {
    let mut doc = doc(
        r#"<form>
            <input id="a" type="radio" name="status" value="Draft" checked>
            <input id="b" type="radio" name="status" value="Approved">
        </form>
        <input id="other" type="radio" name="status" value="Elsewhere" checked>"#,
    );
    let (a, b, other) = (by_id(&doc, "a"), by_id(&doc, "b"), by_id(&doc, "other"));
    doc.set_checked(&b, true);
    assert!(!doc.checked(&a));
    assert!(doc.checked(&b));
    assert!(doc.checked(&other));
    assert_eq!(doc.query_all(None, "form input:checked"), vec![b]);
}

#[test]
fn constraint_validation_rules() {
    let mut doc = doc(
        r#"<form>
            <input id="req" name="title" required>
            <input id="mail" type="email" name="email" value="not-an-email">
            <input id="short" name="code" minlength="3" value="ab">
            <input id="off" name="skip" required disabled>
            <input id="box" type="checkbox" name="agree" required>
            <input id="r1" type="radio" name="basis" value="a" required>
            <input id="r2" type="radio" name="basis" value="b">
            <select id="sel" required><option value="">Choose</option><option value="x">X</option></select>
            <div id="plain"></div>
        </form>"#,
    );
    for id in ["req", "mail", "short", "box", "r1", "sel"] {
        assert!(!doc.check_validity(&by_id(&doc, id)), "#{id} should be invalid");
    }
    assert!(doc.check_validity(&by_id(&doc, "off")));
    assert!(doc.check_validity(&by_id(&doc, "plain")));

    let req = by_id(&doc, "req");
    doc.set_value(&req, "Payroll");
    let mail = by_id(&doc, "mail");
    doc.set_value(&mail, "dpo@example.org");
    let r2 = by_id(&doc, "r2");
    doc.set_checked(&r2, true);
    assert!(doc.check_validity(&req));
    assert!(doc.check_validity(&mail));
    assert!(doc.check_validity(&by_id(&doc, "r1")));
    assert_eq!(doc.query_all(None, ":invalid").len(), 3);
}

// =============================================================
// Tree mutation and interaction
// =============================================================

#[test]
fn append_child_moves_rows_to_the_end() {
    let mut doc = doc(TABLE);
    let tbody = doc.query(None, "tbody").expect("tbody");
    let r1 = by_id(&doc, "r1");
    doc.append_child(&tbody, &r1);
    assert_eq!(doc.query_all(None, "tbody tr"), vec![by_id(&doc, "r2"), r1]);
}

#[test]
fn insert_before_places_node_ahead_of_reference() {
    let mut doc = doc(TABLE);
    let table = by_id(&doc, "records");
    let wrapper = doc.parent(&table).expect("wrapper");
    let search = doc.create_element("div").expect("div");
    doc.insert_before(&wrapper, &search, &table);
    assert_eq!(doc.query_all(Some(&wrapper), "div, table"), vec![search, table]);
}

#[test]
fn append_child_refuses_to_create_cycles() {
    let mut doc = doc(TABLE);
    let table = by_id(&doc, "records");
    let r1 = by_id(&doc, "r1");
    doc.append_child(&r1, &table);
    assert_eq!(doc.parent(&table).map(|p| doc.tag_name(&p)), Some("div".to_string()));
}

#[test]
fn interaction_side_effects_are_recorded() {
    let mut doc = doc(TABLE);
    let r1 = by_id(&doc, "r1");
    doc.focus(&r1);
    doc.scroll_into_view(&r1);
    doc.dispatch_event(&r1, "change");
    assert_eq!(doc.focused(), Some(r1));
    assert_eq!(doc.scrolled_into_view(), &[r1]);
    assert_eq!(doc.dispatched_events(), &[(r1, "change".to_string())]);
}
