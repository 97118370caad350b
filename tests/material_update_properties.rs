//! Merge-Update Property Tests
//!
//! For any stored material D and any patch P:
//! - created is kept, updated moves forward
//! - fields absent from P keep D's value
//! - fields present in P take P's value exactly, zero values included

use std::sync::Arc;

use lessonpack::blob_store::MemoryBlobStore;
use lessonpack::document_store::LocalDocumentStore;
use lessonpack::material::{
    GraphicAction, LessonAvatar, LessonGraphic, LessonMusic, MusicAction, Position3D,
};
use lessonpack::{
    EngineConfig, LessonId, LessonMaterial, LessonMaterialPatch, LessonMaterialService,
};
use proptest::option;
use proptest::prelude::*;

type Service = LessonMaterialService<LocalDocumentStore, MemoryBlobStore>;

fn service() -> Service {
    LessonMaterialService::new(
        Arc::new(LocalDocumentStore::in_memory()),
        Arc::new(MemoryBlobStore::new()),
        EngineConfig::default(),
    )
}

fn avatar_strategy() -> impl Strategy<Value = LessonAvatar> {
    (0.0f32..600.0, 0.0f32..30.0, -5.0f64..5.0).prop_map(|(elapsed_time, duration_sec, x)| {
        LessonAvatar {
            elapsed_time,
            duration_sec,
            moving: Position3D { x, y: 0.0, z: 0.0 },
        }
    })
}

fn graphic_strategy() -> impl Strategy<Value = LessonGraphic> {
    (
        0.0f32..600.0,
        1i64..1000,
        prop_oneof![
            Just(GraphicAction::Show),
            Just(GraphicAction::Hide),
            Just(GraphicAction::Transition)
        ],
    )
        .prop_map(|(elapsed_time, graphic_id, action)| LessonGraphic {
            elapsed_time,
            graphic_id,
            action,
        })
}

fn music_strategy() -> impl Strategy<Value = LessonMusic> {
    (0.0f32..600.0, 1i64..50, 0.0f32..1.0, any::<bool>()).prop_map(
        |(elapsed_time, background_music_id, volume, is_loop)| LessonMusic {
            elapsed_time,
            action: MusicAction::Start,
            background_music_id,
            volume,
            is_fading: false,
            is_loop,
        },
    )
}

fn material_strategy() -> impl Strategy<Value = LessonMaterial> {
    (
        0i64..100,
        0i64..100,
        0.0f32..3600.0,
        "#[0-9a-f]{6}",
        0i64..100,
        prop::collection::vec(avatar_strategy(), 0..4),
        prop::collection::vec(graphic_strategy(), 0..4),
        prop::collection::vec(music_strategy(), 0..3),
    )
        .prop_map(|fields| {
            let (
                user_id,
                avatar_id,
                duration_sec,
                color,
                background_image_id,
                avatars,
                graphics,
                musics,
            ) = fields;
            let mut material = LessonMaterial::new(LessonId::new(7));
            material.user_id = user_id;
            material.avatar_id = avatar_id;
            material.duration_sec = duration_sec;
            material.avatar_light_color = color;
            material.background_image_id = background_image_id;
            material.avatars = avatars;
            material.graphics = graphics;
            material.musics = musics;
            material
        })
}

fn patch_strategy() -> impl Strategy<Value = LessonMaterialPatch> {
    (
        option::of(0i64..100),
        option::of(0i64..100),
        option::of(prop_oneof![Just(0.0f32), 0.0f32..3600.0]),
        option::of(prop_oneof![Just(String::new()), "#[0-9a-f]{6}"]),
        option::of(0i64..100),
        option::of(prop::collection::vec(avatar_strategy(), 0..4)),
        option::of(prop::collection::vec(graphic_strategy(), 0..4)),
        option::of(prop::collection::vec(music_strategy(), 0..3)),
    )
        .prop_map(|fields| {
            let (
                user_id,
                avatar_id,
                duration_sec,
                avatar_light_color,
                background_image_id,
                avatars,
                graphics,
                musics,
            ) = fields;
            LessonMaterialPatch {
                user_id,
                avatar_id,
                duration_sec,
                avatar_light_color,
                background_image_id,
                avatars,
                graphics,
                musics,
                ..Default::default()
            }
        })
}

/// Expected value: the patch's when supplied, the stored one otherwise.
fn expect<T: Clone>(supplied: &Option<T>, stored: &T) -> T {
    supplied.clone().unwrap_or_else(|| stored.clone())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn update_merges_by_presence(material in material_strategy(), patch in patch_strategy()) {
        let service = service();
        let lesson = LessonId::new(7);
        let stored = service.create(lesson, material).unwrap();

        let merged = service.update(stored.id, lesson, &patch).unwrap();

        prop_assert_eq!(merged.created, stored.created);
        prop_assert!(merged.updated > stored.updated);
        prop_assert_eq!(merged.id, stored.id);
        prop_assert_eq!(merged.lesson_id, stored.lesson_id);
        prop_assert_eq!(merged.version, stored.version);

        prop_assert_eq!(merged.user_id, expect(&patch.user_id, &stored.user_id));
        prop_assert_eq!(merged.avatar_id, expect(&patch.avatar_id, &stored.avatar_id));
        prop_assert_eq!(merged.duration_sec, expect(&patch.duration_sec, &stored.duration_sec));
        prop_assert_eq!(
            &merged.avatar_light_color,
            &expect(&patch.avatar_light_color, &stored.avatar_light_color)
        );
        prop_assert_eq!(
            merged.background_image_id,
            expect(&patch.background_image_id, &stored.background_image_id)
        );
        prop_assert_eq!(&merged.avatars, &expect(&patch.avatars, &stored.avatars));
        prop_assert_eq!(&merged.graphics, &expect(&patch.graphics, &stored.graphics));
        prop_assert_eq!(&merged.musics, &expect(&patch.musics, &stored.musics));

        // Lanes the patch never names
        prop_assert_eq!(&merged.drawings, &stored.drawings);
        prop_assert_eq!(&merged.embeddings, &stored.embeddings);
        prop_assert_eq!(&merged.speeches, &stored.speeches);
        prop_assert_eq!(&merged.voice_synthesis_config, &stored.voice_synthesis_config);
    }

    #[test]
    fn repeated_updates_keep_created(patches in prop::collection::vec(patch_strategy(), 1..5)) {
        let service = service();
        let lesson = LessonId::new(7);
        let stored = service.create(lesson, LessonMaterial::new(lesson)).unwrap();

        let mut previous = stored.clone();
        for patch in &patches {
            let merged = service.update(stored.id, lesson, patch).unwrap();
            prop_assert_eq!(merged.created, stored.created);
            prop_assert!(merged.updated > previous.updated);
            previous = merged;
        }
    }
}

// =============================================================================
// Scenario
// =============================================================================

/// Changing only the light color leaves the graphics lane untouched.
#[test]
fn test_light_color_update_keeps_graphics() {
    let service = service();
    let lesson = LessonId::new(7);
    let mut body = LessonMaterial::new(lesson);
    body.graphics = vec![
        LessonGraphic {
            elapsed_time: 0.5,
            graphic_id: 101,
            action: GraphicAction::Show,
        },
        LessonGraphic {
            elapsed_time: 4.0,
            graphic_id: 101,
            action: GraphicAction::Hide,
        },
    ];
    let stored = service.create(lesson, body).unwrap();

    let patch = LessonMaterialPatch::from_json(br##"{"avatarLightColor":"#ffffff"}"##).unwrap();
    let merged = service.update(stored.id, lesson, &patch).unwrap();

    assert_eq!(merged.avatar_light_color, "#ffffff");
    assert_eq!(merged.graphics, stored.graphics);
    assert_eq!(merged.created, stored.created);
    assert!(merged.updated > stored.updated);
}

/// A null field in the body counts as not supplied.
#[test]
fn test_null_field_is_absent() {
    let service = service();
    let lesson = LessonId::new(7);
    let mut body = LessonMaterial::new(lesson);
    body.duration_sec = 42.0;
    let stored = service.create(lesson, body).unwrap();

    let patch = LessonMaterialPatch::from_json(br#"{"durationSec":null}"#).unwrap();
    assert!(patch.is_empty());
    let merged = service.update(stored.id, lesson, &patch).unwrap();
    assert_eq!(merged.duration_sec, 42.0);
}

/// A negative duration in a patch is rejected and nothing changes.
#[test]
fn test_invalid_patch_rejected() {
    let service = service();
    let lesson = LessonId::new(7);
    let stored = service.create(lesson, LessonMaterial::new(lesson)).unwrap();

    let patch = LessonMaterialPatch {
        duration_sec: Some(-1.0),
        ..Default::default()
    };
    let err = service.update(stored.id, lesson, &patch).unwrap_err();
    assert_eq!(err.code(), "LESSON_INVALID_INPUT");
    assert_eq!(service.current(lesson).unwrap().updated, stored.updated);
}
