use std::sync::Arc;

use spine_ngin::runtime::atlas::{Atlas, AtlasError, AtlasPage, dispose_page};

use crate::common::test_utils::{FakeLoader, Fixture, hero_atlas, init_logger};

mod common;

#[test]
fn page_count_matches_declared_pages() {
    init_logger();
    let fixture = Fixture::new("atlas-pages");
    let path = fixture.write("hero.atlas", &hero_atlas("hero.png"));

    let mut loader = FakeLoader::new();
    let atlas = Atlas::create_from_file(&path, &mut loader).unwrap();
    assert_eq!(atlas.pages().len(), 1);
    assert_eq!(atlas.regions().len(), 2);
    assert!(atlas.find_region("head").is_some());
    assert!(atlas.find_region("tail").is_none());
    assert_eq!(loader.requested, vec![fixture.path("hero.png")]);
}

#[test]
fn page_dimensions_come_from_the_texture_not_the_file() {
    let fixture = Fixture::new("atlas-dims");
    // Declared size 128x128, delivered texture 64x32.
    let path = fixture.write("hero.atlas", &hero_atlas("hero.png"));

    let mut loader = FakeLoader::new();
    let atlas = Atlas::create_from_file(&path, &mut loader).unwrap();
    let page = &atlas.pages()[0];
    assert_eq!((page.width, page.height), (64, 32));
    assert!(page.renderer_object.is_some());
}

#[test]
fn multi_page_atlas_binds_every_page() {
    let fixture = Fixture::new("atlas-multi");
    let text = format!(
        "{}\n{}",
        hero_atlas("page_a.png"),
        hero_atlas("page_b.png").replacen("head", "arm", 1)
    );
    let path = fixture.write("multi.atlas", &text);

    let mut loader = FakeLoader::new();
    let atlas = Atlas::create_from_file(&path, &mut loader).unwrap();
    assert_eq!(atlas.pages().len(), 2);
    assert_eq!(loader.requested.len(), 2);
    assert_eq!(atlas.find_region("arm").unwrap().page, 1);
    assert_eq!(atlas.find_region("head").unwrap().page, 0);
}

#[test]
fn texture_failure_aborts_and_releases_bound_pages() {
    let fixture = Fixture::new("atlas-tex-fail");
    let text = format!("{}\n{}", hero_atlas("page_a.png"), hero_atlas("page_b.png"));
    let path = fixture.write("multi.atlas", &text);

    let mut loader = FakeLoader::new();
    loader.fail_after = Some(1);
    match Atlas::create_from_file(&path, &mut loader) {
        Err(AtlasError::Texture { path, .. }) => {
            assert_eq!(path, fixture.path("page_b.png"));
        }
        other => panic!("expected texture error, got {other:?}"),
    }
    // The first page was bound and must be released again: only the loader's
    // own record still references its texture.
    assert_eq!(loader.loaded.len(), 1);
    assert_eq!(Arc::strong_count(&loader.loaded[0]), 1);
}

#[test]
fn missing_atlas_file_fails() {
    let fixture = Fixture::new("atlas-missing");
    let mut loader = FakeLoader::new();
    assert!(matches!(
        Atlas::create_from_file(&fixture.path("gone.atlas"), &mut loader),
        Err(AtlasError::File(_))
    ));
    assert!(loader.requested.is_empty());
}

#[test]
fn malformed_atlas_fails() {
    let fixture = Fixture::new("atlas-malformed");
    let path = fixture.write("broken.atlas", "size: 12,12\nhero.png\n");
    let mut loader = FakeLoader::new();
    assert!(matches!(
        Atlas::create_from_file(&path, &mut loader),
        Err(AtlasError::Parse(_))
    ));

    let empty = fixture.write("empty.atlas", "\n\n");
    assert!(matches!(
        Atlas::create_from_file(&empty, &mut loader),
        Err(AtlasError::Parse(_))
    ));
}

#[test]
fn dispose_is_idempotent() {
    let texture = FakeLoader::make_texture(8, 8);
    let shared = texture.clone();
    let mut page = AtlasPage {
        name: "page.png".to_string(),
        width: 8,
        height: 8,
        renderer_object: Some(texture),
    };
    dispose_page(&mut page);
    assert!(page.renderer_object.is_none());
    assert_eq!(Arc::strong_count(&shared), 1);
    // Second dispose must not double-release.
    dispose_page(&mut page);
    assert_eq!(Arc::strong_count(&shared), 1);
}

#[test]
fn dispose_tolerates_a_page_whose_create_failed() {
    let mut page = AtlasPage {
        name: "never_bound.png".to_string(),
        width: 0,
        height: 0,
        renderer_object: None,
    };
    dispose_page(&mut page);
    assert!(page.renderer_object.is_none());
}

#[test]
fn dropping_the_atlas_releases_all_texture_references() {
    let fixture = Fixture::new("atlas-drop");
    let path = fixture.write("hero.atlas", &hero_atlas("hero.png"));

    let mut loader = FakeLoader::new();
    let atlas = Atlas::create_from_file(&path, &mut loader).unwrap();
    assert_eq!(Arc::strong_count(&loader.loaded[0]), 2);
    drop(atlas);
    assert_eq!(Arc::strong_count(&loader.loaded[0]), 1);
}
