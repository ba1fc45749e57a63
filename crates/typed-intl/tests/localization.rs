use chrono::NaiveDate;
use std::sync::Arc;
use std::thread;
use typed_intl::i18n::{Catalogue, Fragment, IntlError, Localization, LocalizationConfig};
use typed_intl::values;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn catalogue(entries: &[(&str, &[(&str, &str)])]) -> Catalogue {
    entries
        .iter()
        .map(|(locale, messages)| {
            let messages = messages
                .iter()
                .map(|(id, template)| (id.to_string(), template.to_string()))
                .collect();
            (locale.to_string(), messages)
        })
        .collect()
}

fn greetings() -> Catalogue {
    catalogue(&[
        ("en-NZ", &[("hello", "Hello!")]),
        ("fr", &[("hello", "Bonjour!")]),
    ])
}

fn setup(initial: &str) -> (Localization, Catalogue) {
    init_tracing();
    let i18n = Localization::new(&["en-NZ", "fr"], initial).unwrap();
    let messages = i18n.define_messages(greetings()).unwrap();
    (i18n, messages)
}

#[test]
fn english() {
    let (i18n, messages) = setup("en-NZ");
    assert_eq!(i18n.format_message(&messages, "hello", None).unwrap(), "Hello!");
}

#[test]
fn french() {
    let (i18n, messages) = setup("fr");
    assert_eq!(i18n.format_message(&messages, "hello", None).unwrap(), "Bonjour!");
}

#[test]
fn changing_language() {
    let (i18n, messages) = setup("en-NZ");
    assert_eq!(i18n.format_message(&messages, "hello", None).unwrap(), "Hello!");

    i18n.set_locale("fr").unwrap();
    assert_eq!(i18n.format_message(&messages, "hello", None).unwrap(), "Bonjour!");
}

#[test]
fn invalid_locale_casing() {
    let err = Localization::new(&["en-nz"], "en-nz").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid locale: \"en-nz\", did you mean \"en-NZ\""
    );
}

#[test]
fn unknown_locale() {
    let err = Localization::new(&["en_NZ"], "en_NZ").unwrap_err();
    assert_eq!(err.to_string(), "Invalid locale: \"en_NZ\"");
}

#[test]
fn every_bad_locale_is_reported() {
    let err = Localization::new(&["en-nz", "fr", "EN"], "fr").unwrap_err();
    let IntlError::InvalidLocales(errors) = err else {
        panic!("expected locale errors");
    };
    assert_eq!(errors.len(), 2);
}

#[test]
fn placeholder() {
    let i18n = Localization::new(&["en-NZ", "fr"], "en-NZ").unwrap();
    let messages = i18n
        .define_messages(catalogue(&[("en-NZ", &[("hello", "Hello {name}!")])]))
        .unwrap();

    let bag = values! { "name" => "Jane" };
    assert_eq!(
        i18n.format_message(&messages, "hello", Some(&bag)).unwrap(),
        "Hello Jane!"
    );
}

#[test]
fn currency() {
    let i18n = Localization::new(&["en-NZ", "fr"], "en-NZ").unwrap();
    let messages = i18n
        .define_messages(catalogue(&[(
            "en-NZ",
            &[("price", "That will be {price, number, ::currency/EUR}!")],
        )]))
        .unwrap();

    let bag = values! { "price" => 100 };
    assert_eq!(
        i18n.format_message(&messages, "price", Some(&bag)).unwrap(),
        "That will be €100.00!"
    );
}

#[test]
fn number_grouping_follows_locale() {
    let i18n = Localization::new(&["en-IN", "en-NZ"], "en-IN").unwrap();
    let messages = i18n
        .define_messages(catalogue(&[
            ("en-IN", &[("total", "{n, number}")]),
            ("en-NZ", &[("total", "{n, number}")]),
        ]))
        .unwrap();

    let bag = values! { "n" => 1234567 };
    assert_eq!(
        i18n.format_message(&messages, "total", Some(&bag)).unwrap(),
        "12,34,567"
    );

    i18n.set_locale("en-NZ").unwrap();
    assert_eq!(
        i18n.format_message(&messages, "total", Some(&bag)).unwrap(),
        "1,234,567"
    );
}

#[test]
fn extension_tags_are_valid_locales() {
    let i18n = Localization::new(&["en-US-u-ca-buddhist", "fr"], "fr").unwrap();
    assert!(i18n.set_locale("en-US-u-ca-buddhist").is_ok());

    let err = Localization::new(&["iw"], "iw").unwrap_err();
    assert_eq!(err.to_string(), "Invalid locale: \"iw\", did you mean \"he\"");
}

#[test]
fn date() {
    let i18n = Localization::new(&["en-NZ", "fr"], "en-NZ").unwrap();
    let messages = i18n
        .define_messages(catalogue(&[(
            "en-NZ",
            &[("date", "Some date is {date, date, ::yyyyMMdd}!")],
        )]))
        .unwrap();

    let date = NaiveDate::from_ymd_opt(1995, 12, 17)
        .unwrap()
        .and_hms_opt(3, 24, 0)
        .unwrap();
    let bag = values! { "date" => date };
    assert_eq!(
        i18n.format_message(&messages, "date", Some(&bag)).unwrap(),
        "Some date is 17/12/1995!"
    );
}

#[test]
fn plural_branches() {
    let i18n = Localization::new(&["en-NZ"], "en-NZ").unwrap();
    let messages = i18n
        .define_messages(catalogue(&[(
            "en-NZ",
            &[(
                "inbox",
                "{count, plural, =0 {No messages} one {# message} other {# messages}}",
            )],
        )]))
        .unwrap();

    let render = |count: i64| {
        i18n.format_message(&messages, "inbox", Some(&values! { "count" => count }))
            .unwrap()
    };
    assert_eq!(render(0), "No messages");
    assert_eq!(render(1), "1 message");
    assert_eq!(render(5), "5 messages");
}

#[test]
fn select_branches() {
    let i18n = Localization::new(&["en-NZ"], "en-NZ").unwrap();
    let messages = i18n
        .define_messages(catalogue(&[(
            "en-NZ",
            &[(
                "reply",
                "{gender, select, female {She replied} male {He replied} other {They replied}}",
            )],
        )]))
        .unwrap();

    let render = |gender: &str| {
        i18n.format_message(&messages, "reply", Some(&values! { "gender" => gender }))
            .unwrap()
    };
    assert_eq!(render("female"), "She replied");
    assert_eq!(render("male"), "He replied");
    assert_eq!(render("unknown"), "They replied");
}

#[test]
fn tag_receives_rendered_children() {
    let i18n = Localization::new(&["en-NZ"], "en-NZ").unwrap();
    let messages = i18n
        .define_messages(catalogue(&[(
            "en-NZ",
            &[(
                "unread",
                "You have <b>{count, plural, one {# message} other {# messages}}</b>",
            )],
        )]))
        .unwrap();

    let bag = values! { "count" => 3 }.tag("b", |children| {
        assert_eq!(children, [Fragment::text("3 messages")]);
        Fragment::element("b", children)
    });

    let parts = i18n
        .format_message_parts(&messages, "unread", Some(&bag))
        .unwrap();
    assert_eq!(
        parts,
        [
            Fragment::text("You have "),
            Fragment::element("b", vec![Fragment::text("3 messages")]),
        ]
    );
    assert_eq!(
        i18n.format_message(&messages, "unread", Some(&bag)).unwrap(),
        "You have <b>3 messages</b>"
    );
}

#[test]
fn missing_argument_names_the_key() {
    let i18n = Localization::new(&["en-NZ"], "en-NZ").unwrap();
    let messages = i18n
        .define_messages(catalogue(&[("en-NZ", &[("hello", "Hello {name}!")])]))
        .unwrap();

    let err = i18n
        .format_message(&messages, "hello", Some(&values! {}))
        .unwrap_err();
    assert_eq!(err.to_string(), "missing argument 'name'");

    let err = i18n.format_message(&messages, "hello", None).unwrap_err();
    assert!(matches!(err, IntlError::MissingArgument(name) if name == "name"));
}

#[test]
fn isolation_from_config() {
    let config = LocalizationConfig::new(["en-NZ"]).with_isolating(true);
    let i18n = Localization::from_config(&config).unwrap();
    let messages = i18n
        .define_messages(catalogue(&[("en-NZ", &[("hello", "Hello {name}!")])]))
        .unwrap();

    let bag = values! { "name" => "Jane" };
    assert_eq!(
        i18n.format_message(&messages, "hello", Some(&bag)).unwrap(),
        "Hello \u{2068}Jane\u{2069}!"
    );
}

#[test]
fn renders_snapshot_locale_while_switching() {
    init_tracing();
    let i18n = Arc::new(Localization::new(&["en-NZ", "fr"], "en-NZ").unwrap());
    let messages = Arc::new(i18n.define_messages(greetings()).unwrap());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let i18n = Arc::clone(&i18n);
            let messages = Arc::clone(&messages);
            thread::spawn(move || {
                for _ in 0..200 {
                    let locale = i18n.current_locale();
                    let text = i18n
                        .format_message_in(&locale, &messages, "hello", None)
                        .unwrap();
                    let expected = match locale.as_str() {
                        "fr" => "Bonjour!",
                        _ => "Hello!",
                    };
                    assert_eq!(text, expected);
                }
            })
        })
        .collect();

    for i in 0..200 {
        let tag = if i % 2 == 0 { "fr" } else { "en-NZ" };
        i18n.set_locale(tag).unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }

    // every render used an already-parsed AST
    assert_eq!(i18n.get_cache_stats().ast_cache_size, 2);
}
