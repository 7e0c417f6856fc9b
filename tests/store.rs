use http::Uri;
use morsel::{Cookie, CookieStore, InMemoryCookieStore, NullCookieStore};
use std::{thread, time::Duration};

fn uri(uri: &str) -> Uri {
    uri.parse().unwrap()
}

#[test]
fn session_cookie_scenario() {
    let store = InMemoryCookieStore::new();
    let origin = uri("https://example.com/app");

    store
        .add(
            &origin,
            Cookie::builder("sid", "abc123")
                .domain("example.com")
                .path("/")
                .build(),
        )
        .unwrap();

    let matched = store.get(&uri("http://example.com/anything")).unwrap();

    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].name(), "sid");
    assert_eq!(matched[0].value(), "abc123");

    assert!(store.get(&uri("http://other.com/")).unwrap().is_empty());
}

#[test]
fn short_lived_cookie_disappears_after_deadline() {
    let store = InMemoryCookieStore::new();
    let origin = uri("https://example.com/");

    store
        .add(&origin, Cookie::builder("temp", "x").max_age(1).build())
        .unwrap();

    assert_eq!(store.get(&origin).unwrap().len(), 1);

    thread::sleep(Duration::from_millis(1100));

    assert!(store.get(&origin).unwrap().is_empty());
    assert!(store.cookies().is_empty());
}

#[test]
fn path_boundary_is_respected() {
    let store = InMemoryCookieStore::new();
    let origin = uri("https://example.com/foo");

    store
        .add(&origin, Cookie::builder("scoped", "1").path("/foo").build())
        .unwrap();

    assert_eq!(store.get(&uri("https://example.com/foo")).unwrap().len(), 1);
    assert_eq!(store.get(&uri("https://example.com/foo/bar")).unwrap().len(), 1);
    assert!(store.get(&uri("https://example.com/foobar")).unwrap().is_empty());
}

#[test]
fn concurrent_adds_with_distinct_identities_all_visible() {
    let store = InMemoryCookieStore::new();

    let threads: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();

            thread::spawn(move || {
                let origin = uri("https://example.com/");

                for i in 0..25 {
                    store
                        .add(&origin, Cookie::new(format!("c-{}-{}", t, i), "v"))
                        .unwrap();
                }
            })
        })
        .collect();

    for thread in threads {
        thread.join().unwrap();
    }

    assert_eq!(store.cookies().len(), 200);
    assert_eq!(store.get(&uri("https://example.com/")).unwrap().len(), 200);
}

#[test]
fn concurrent_readers_and_writers_do_not_lose_removals() {
    let store = InMemoryCookieStore::new();
    let origin = uri("https://example.com/");

    for i in 0..100 {
        store
            .add(&origin, Cookie::new(format!("c-{}", i), "v"))
            .unwrap();
    }

    let reader = {
        let store = store.clone();

        thread::spawn(move || {
            for _ in 0..100 {
                let _ = store.get(&uri("https://example.com/")).unwrap();
            }
        })
    };

    for i in 0..100 {
        assert!(store.remove(Some(&origin), &Cookie::new(format!("c-{}", i), "")));
    }

    reader.join().unwrap();

    assert!(store.cookies().is_empty());
}

#[test]
fn stores_share_one_contract() {
    let stores: Vec<Box<dyn CookieStore>> = vec![
        Box::new(InMemoryCookieStore::new()),
        Box::new(NullCookieStore::new()),
    ];
    let origin = uri("https://example.com/");

    for store in &stores {
        store.add(&origin, Cookie::new("foo", "bar")).unwrap();
        let _ = store.get(&origin).unwrap();
        let _ = store.cookies();
        let _ = store.uris();
        store.remove(Some(&origin), &Cookie::new("foo", "bar"));
        store.remove_all();
    }
}
