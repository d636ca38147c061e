use rankcrawl::config::ExtractorConfig;
use rankcrawl::extractor::*;

fn extractor_with_limit(max_content_length: usize) -> ContentExtractor {
    ContentExtractor::new(ExtractorConfig {
        max_content_length,
        ..ExtractorConfig::default()
    })
    .unwrap()
}

mod title_and_description {
    use super::*;

    #[test]
    fn test_title_extracted_and_cleaned() {
        let html = "<html><head><title>  My   Page  &amp; Co  </title></head><body>x</body></html>";
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.title, "My Page  Co");
    }

    #[test]
    fn test_missing_title_is_empty() {
        let doc = extract_content("<html><body><p>Hello</p></body></html>", "https://example.com");
        assert_eq!(doc.title, "");
    }

    #[test]
    fn test_meta_description() {
        let html = r#"<html><head><meta name="description" content="Learn   Rust today!"></head>
            <body>x</body></html>"#;
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.description, "Learn Rust today!");
    }

    #[test]
    fn test_other_meta_tags_ignored() {
        let html =
            r#"<html><head><meta name="keywords" content="a, b"></head><body>x</body></html>"#;
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.description, "");
    }
}

mod body_content {
    use super::*;

    #[test]
    fn test_non_content_elements_stripped() {
        let html = r#"<html><body>
            <header>Site header</header>
            <nav>Menu links</nav>
            <p>Real text</p>
            <script>var tracking = 1;</script>
            <style>.x { color: red }</style>
            <iframe>Ad frame</iframe>
            <aside>Sidebar</aside>
            <footer>Footer text</footer>
        </body></html>"#;
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.content, "Real text");
        assert_eq!(doc.word_count, 2);
    }

    #[test]
    fn test_main_preferred_over_article() {
        let html = r#"<html><body>
            <article>Article text</article>
            <main>Main text</main>
        </body></html>"#;
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.content, "Main text");
    }

    #[test]
    fn test_cms_content_class() {
        let html = r#"<html><body>
            <div class="sidebar-ish">Noise</div>
            <div class="entry-content"><p>Blog post body</p></div>
        </body></html>"#;
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.content, "Blog post body");
    }

    #[test]
    fn test_role_main() {
        let html = r#"<html><body><div>Outer</div><div role="main">Inner body</div></body></html>"#;
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.content, "Inner body");
    }

    #[test]
    fn test_empty_match_falls_through_to_next_selector() {
        let html = r#"<html><body>
            <main><script>only script</script></main>
            <article>Article wins</article>
        </body></html>"#;
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.content, "Article wins");
    }

    #[test]
    fn test_content_selector_inside_stripped_element_ignored() {
        let html = r#"<html><body>
            <nav><div class="content">Menu Login Signup</div></nav>
            <div class="entry-content"><p>The real article text.</p></div>
            <header><h1>Site Logo</h1></header>
            <h2>Real heading</h2>
        </body></html>"#;
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.content, "The real article text.");
        assert_eq!(doc.headings, "Real heading");
    }

    #[test]
    fn test_body_fallback_without_boilerplate() {
        let html = r#"<html><body>
            <div><nav>Nav</nav><p>First paragraph.</p></div>
            <div><p>Second paragraph.</p><footer>Foot</footer></div>
        </body></html>"#;
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.content, "First paragraph. Second paragraph.");
        assert_eq!(doc.word_count, 4);
    }

    #[test]
    fn test_adjacent_blocks_do_not_merge_words() {
        let html = "<html><body><main><p>one</p><p>two</p></main></body></html>";
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.content, "one two");
    }

    #[test]
    fn test_content_truncated_with_marker() {
        let words = "word ".repeat(100);
        let html = format!("<html><body><main>{words}</main></body></html>");
        let doc = extractor_with_limit(20).extract(&html, "https://example.com");
        assert_eq!(doc.content, "word word word word ...");
        assert_eq!(doc.content.chars().count(), 23);
    }

    #[test]
    fn test_disallowed_characters_removed() {
        let html = "<html><body><main>Cost: $10 &lt;approx&gt; — 50% off! (today)</main></body></html>";
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.content, "Cost: 10 approx  50 off! (today)");
    }
}

mod headings {
    use super::*;

    #[test]
    fn test_headings_joined_in_document_order() {
        let html = r#"<html><body>
            <h1>Intro</h1><h4>Ignored level</h4><h2>Details</h2><h3>More</h3>
        </body></html>"#;
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.headings, "Intro | Details | More");
    }

    #[test]
    fn test_only_first_five_non_empty_headings() {
        let html = r#"<html><body>
            <h1>One</h1><h2>   </h2><h2>Two</h2><h3>Three</h3><h2>Four</h2><h3>Five</h3><h1>Six</h1>
        </body></html>"#;
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.headings, "One | Two | Three | Four | Five");
    }

    #[test]
    fn test_headings_inside_stripped_elements_skipped() {
        let html = r#"<html><body><header><h1>Logo</h1></header>
            <main><h2>Body heading</h2></main></body></html>"#;
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.headings, "Body heading");
    }
}

mod robustness {
    use super::*;

    #[test]
    fn test_empty_input() {
        let doc = extract_content("", "https://example.com");
        assert_eq!(doc.title, "");
        assert_eq!(doc.description, "");
        assert_eq!(doc.content, "");
        assert_eq!(doc.headings, "");
        assert_eq!(doc.word_count, 0);
        assert!(doc.error.is_none());
    }

    #[test]
    fn test_plain_text_input() {
        let doc = extract_content("just some words", "https://example.com");
        assert_eq!(doc.content, "just some words");
        assert_eq!(doc.word_count, 3);
    }

    #[test]
    fn test_malformed_html() {
        let html = "<html><head><title>Broken<body><main><p>unclosed <b>bold <div>mixed</p></main";
        let doc = extract_content(html, "https://example.com");
        assert_eq!(doc.word_count, doc.content.split_whitespace().count());
    }

    #[test]
    fn test_arbitrary_bytes() {
        let extractor = ContentExtractor::default();
        let inputs: Vec<Vec<u8>> = vec![
            vec![0xff, 0xfe, 0x00, 0x3c, 0x68, 0x31],
            b"<<<>>><!--".to_vec(),
            (0u8..=255).collect(),
            b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR".to_vec(),
        ];
        for bytes in inputs {
            let doc = extractor.extract_bytes(&bytes, "https://example.com");
            assert_eq!(doc.word_count, doc.content.split_whitespace().count());
        }
    }

    #[test]
    fn test_invalid_configured_selector_rejected_up_front() {
        let res = ContentExtractor::new(ExtractorConfig {
            content_selectors: vec!["main".into(), "[[nope".into()],
            ..ExtractorConfig::default()
        });
        let err = res.unwrap_err();
        assert!(err.to_string().contains("[[nope"));
    }

    #[test]
    fn test_custom_selectors_used_in_order() {
        let extractor = ContentExtractor::new(ExtractorConfig {
            content_selectors: vec!["#story".into(), "main".into()],
            ..ExtractorConfig::default()
        })
        .unwrap();
        let html = r#"<html><head><title>T</title></head><body>
            <main>Main text</main><div id="story">Story text</div>
        </body></html>"#;
        let doc = extractor.extract(html, "https://example.com");
        assert_eq!(doc.title, "T");
        assert_eq!(doc.content, "Story text");
        assert!(doc.error.is_none());
    }
}
