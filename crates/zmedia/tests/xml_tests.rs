#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

use zmedia::{from_xml_str, Document, ErrorKind, XmlConfig};

const SPECIAL: &str = "SPECIAL\"'=&<>/\\CHARS";
const SPECIAL_ESCAPED: &str = "SPECIAL&quot;&apos;=&amp;&lt;&gt;/\\CHARS";

fn app_state() -> Document {
    let mut doc = Document::new("App").unwrap();
    let mut root = doc.root_mut();
    root.set_attribute("Version", "2").unwrap();
    {
        let mut child = root.add_child_node("Child").unwrap();
        child.set_attribute("Time", "1000").unwrap();
        child.add_child_node("Element").unwrap().set_node_text("Android");
    }
    {
        let mut playlist = root.add_child_node("Playlist").unwrap();
        for (id, title) in [("1", "Roads"), ("2", "Glory Box")] {
            let mut track = playlist.add_child_node("Track").unwrap();
            track.set_attribute("Id", id).unwrap();
            track.set_node_text(title);
        }
    }
    root.add_child_node("Settings").unwrap();
    doc
}

#[test]
fn test_compact_roundtrip_is_byte_exact() {
    let doc = app_state();
    let xml = doc.to_xml(false);
    let reparsed = Document::read(&xml).unwrap();
    assert_eq!(reparsed, doc);
    assert_eq!(reparsed.to_xml(false), xml);
}

#[test]
fn test_formatted_roundtrip_is_byte_exact() {
    let doc = app_state();
    let xml = doc.to_xml(true);
    let reparsed = Document::read(&xml).unwrap();
    assert_eq!(reparsed, doc);
    assert_eq!(reparsed.to_xml(true), xml);
}

#[test]
fn test_formatted_layout() {
    let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
                    <App Version=\"2\">\n\
                    \t<Child Time=\"1000\">\n\
                    \t\t<Element>Android</Element>\n\
                    \t</Child>\n\
                    \t<Playlist>\n\
                    \t\t<Track Id=\"1\">Roads</Track>\n\
                    \t\t<Track Id=\"2\">Glory Box</Track>\n\
                    \t</Playlist>\n\
                    \t<Settings/>\n\
                    </App>";
    assert_eq!(app_state().to_xml(true), expected);
}

#[test]
fn test_formatted_and_compact_read_the_same() {
    let doc = app_state();
    let compact = Document::read(&doc.to_xml(false)).unwrap();
    let formatted = Document::read(&doc.to_xml(true)).unwrap();
    assert_eq!(compact, formatted);
}

#[test]
fn test_special_characters_in_attribute() {
    let mut doc = Document::new("Root").unwrap();
    doc.root_mut().set_attribute("Value", SPECIAL).unwrap();

    let xml = doc.to_xml(false);
    assert!(xml.contains(&format!("Value=\"{SPECIAL_ESCAPED}\"")));

    let reparsed = Document::read(&xml).unwrap();
    assert_eq!(reparsed.root().attribute("Value"), Some(SPECIAL));
}

#[test]
fn test_special_characters_in_text() {
    let mut doc = Document::new("Root").unwrap();
    doc.set_node_path_value("Note", "a < b & \"c\" > 'd'").unwrap();

    let xml = doc.to_xml(false);
    assert!(xml.ends_with("<Note>a &lt; b &amp; \"c\" &gt; 'd'</Note></Root>"));
    let reparsed = Document::read(&xml).unwrap();
    assert_eq!(reparsed.node_path_value("Note"), Some("a < b & \"c\" > 'd'"));
}

#[test]
fn test_node_path_symmetry() {
    let mut doc = Document::new("App").unwrap();
    doc.set_node_path_value("Child/@Time", "1000").unwrap();
    doc.set_node_path_value("Child/Element", "Android").unwrap();

    assert_eq!(doc.node_path_value("Child/@Time"), Some("1000"));
    assert_eq!(doc.node_path_value("Child/Element"), Some("Android"));
    assert_eq!(doc.node_path_value("Unknown/@Attr"), None);
}

#[test]
fn test_empty_and_bare_paths() {
    let doc = app_state();
    assert_eq!(doc.node_path_value(""), None);
    assert_eq!(doc.node_path_value("Child"), None);
    assert_eq!(doc.node_path_value("@Version"), Some("2"));
    assert_eq!(doc.node_path_value("Playlist/Track"), Some("Roads"));
}

#[test]
fn test_node_paths_survive_roundtrip() {
    let doc = app_state();
    let reparsed = Document::read(&doc.to_xml(true)).unwrap();
    assert_eq!(reparsed.node_path_value("Child/@Time"), Some("1000"));
    assert_eq!(reparsed.node_path_value("Child/Element"), Some("Android"));
    assert_eq!(
        reparsed
            .root()
            .child_node("Playlist")
            .unwrap()
            .child_nodes("Track")
            .iter()
            .map(|t| t.text().unwrap_or_default())
            .collect::<Vec<_>>(),
        ["Roads", "Glory Box"]
    );
}

#[test]
fn test_read_rejects_bad_input() {
    assert!(Document::read("").is_none());
    assert!(Document::read("not xml").is_none());
    assert!(Document::read("<App><Child></App>").is_none());
    assert!(Document::read("<?xml version=\"1.0\"?>").is_none());
}

#[test]
fn test_parse_reports_errors() {
    let err = from_xml_str("<App>\n<Child>\n</App>").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MismatchedTag { .. }));
    assert_eq!(err.span().start.line, 3);
}

#[test]
fn test_new_document_rejects_empty_name() {
    assert!(Document::new("").is_none());
}

#[test]
fn test_new_document_serializes_declaration_and_root() {
    let doc = Document::new("State").unwrap();
    assert_eq!(
        doc.to_xml(false),
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?><State/>"
    );
    assert_eq!(doc.to_string(), doc.to_xml(false));
}

#[test]
fn test_empty_text_distinct_from_no_text() {
    let doc = Document::read("<a><b/><c></c></a>").unwrap();
    let root = doc.root();
    assert_eq!(root.child_node("b").unwrap().text(), None);
    assert_eq!(root.child_node("c").unwrap().text(), Some(""));
    assert_eq!(doc.to_xml(false), format!("{}<a><b/><c></c></a>", declaration()));
}

#[test]
fn test_root_node_from_deep_node() {
    let doc = app_state();
    let track = doc
        .root()
        .child_node("Playlist")
        .and_then(|p| p.child_node("Track"))
        .unwrap();
    assert_eq!(track.root_node().name(), "App");
    assert_eq!(track.root_node().id(), doc.root_id());
    assert_eq!(track.document().node_count(), doc.node_count());
}

#[test]
fn test_typed_reads() {
    let doc = app_state();
    assert_eq!(doc.root().parse_attribute::<u32>("Version").unwrap(), Some(2));
    assert_eq!(
        doc.root()
            .parse_node_path_value::<u64>("Child/@Time")
            .unwrap(),
        Some(1000)
    );
    assert!(doc
        .root()
        .parse_node_path_value::<u64>("Child/Element")
        .is_err());
    assert_eq!(
        doc.root().parse_node_path_value::<u64>("Nope/@Time").unwrap(),
        None
    );
}

#[test]
fn test_declaration_roundtrip() {
    let xml = "<?xml version=\"1.0\" encoding=\"UTF-16\" standalone=\"no\"?>\n<App/>";
    let doc = Document::read(xml).unwrap();
    assert_eq!(doc.declaration().encoding, "UTF-16");
    assert_eq!(doc.declaration().standalone, "no");
    assert_eq!(doc.to_xml(true), xml);
}

#[test]
fn test_depth_limit_from_config() {
    let deep = format!("{}{}", "<a>".repeat(20), "</a>".repeat(20));
    assert!(zmedia::from_xml_str_with_config(&deep, XmlConfig::new(10, 0)).is_err());
    assert!(zmedia::from_xml_str_with_config(&deep, XmlConfig::default()).is_ok());
}

#[test]
fn test_tree_deeper_than_default_parser_limit_roundtrips() {
    let depth = usize::from(XmlConfig::default().max_depth) + 72;
    let path = vec!["Level"; depth].join("/");

    let mut doc = Document::new("App").unwrap();
    doc.set_node_path_value(&format!("{path}/@v"), "1").unwrap();
    doc.set_node_path_value(&format!("{path}/Leaf"), "deep").unwrap();

    for formatted in [false, true] {
        let xml = doc.to_xml(formatted);
        let reparsed = Document::read(&xml).unwrap();
        assert_eq!(reparsed, doc);
        assert_eq!(reparsed.to_xml(formatted), xml);
        assert_eq!(reparsed.node_path_value(&format!("{path}/@v")), Some("1"));
        assert_eq!(reparsed.node_path_value(&format!("{path}/Leaf")), Some("deep"));
    }

    // Untrusted input can still be capped explicitly
    let err = zmedia::from_xml_str_with_config(&doc.to_xml(false), XmlConfig::default())
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MaxDepthExceeded { max: 128 }));
}

#[test]
fn test_very_deep_tree_roundtrips_compact() {
    let depth = 100_000;
    let mut doc = Document::new("App").unwrap();
    doc.set_node_path_value(&vec!["N"; depth].join("/"), "leaf")
        .unwrap();

    let xml = doc.to_xml(false);
    let reparsed = Document::read(&xml).unwrap();
    assert_eq!(reparsed.node_count(), depth + 1);
    assert!(reparsed == doc);
}

#[test]
fn test_invalid_attribute_names_are_rejected() {
    let mut doc = Document::new("App").unwrap();
    for name in ["bad name", "", "9lives", "a\"b", "x=y"] {
        let err = doc.root_mut().set_attribute(name, "x").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument, "{name:?}");
    }
    doc.root_mut().set_attribute("good-name", "x").unwrap();

    let xml = doc.to_xml(false);
    assert!(xml.ends_with("<App good-name=\"x\"/>"));
    assert_eq!(Document::read(&xml).unwrap(), doc);
}

fn declaration() -> &'static str {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"
}
