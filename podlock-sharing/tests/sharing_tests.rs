mod support;

use podlock_keystore::KeystoreError;
use podlock_sharing::{AccessModes, SharingError, SharingLink};
use pretty_assertions::assert_eq;
use support::{env, env_for, url};

#[tokio::test]
async fn file_link_carries_key_and_group() {
    let env = env();
    let file = url("https://pod/example/crypto/a.txt");
    env.encryption.encrypt_file(b"content", &file).await.unwrap();

    let link = env
        .coordinator
        .create_file_sharing_link(&file, AccessModes::read_only())
        .await
        .unwrap();

    match SharingLink::parse(&link).unwrap() {
        SharingLink::File {
            file: linked,
            key,
            group,
        } => {
            assert_eq!(linked, file);
            assert_eq!(key, env.resolver.get_key(&file).await.unwrap());
            assert!(env.groups.group_exists(&group).await);
        }
        other => panic!("expected a file link, got {other:?}"),
    }

    let grants = env.permissions.grants().await;
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].0, file);
    assert_eq!(grants[0].2, AccessModes::read_only());
}

#[tokio::test]
async fn sharing_unknown_file_fails_without_creating_keys() {
    let env = env();
    let file = url("https://pod/example/crypto/never-created.txt");

    let result = env
        .coordinator
        .create_file_sharing_link(&file, AccessModes::read_only())
        .await;

    assert!(matches!(
        result,
        Err(SharingError::Keystore(KeystoreError::KeyNotFound(_)))
    ));
    assert!(env.permissions.grants().await.is_empty());
}

#[tokio::test]
async fn folder_link_grants_subtree_and_keystore() {
    let env = env();
    let folder = url("https://pod/example/crypto/shared/");
    let file = url("https://pod/example/crypto/shared/a.txt");
    env.encryption.encrypt_file(b"content", &file).await.unwrap();

    let link = env
        .coordinator
        .create_folder_sharing_link(&folder, AccessModes::read_write())
        .await
        .unwrap();

    let parsed = SharingLink::parse(&link).unwrap();
    let (keystore_url, keystore_key) = match &parsed {
        SharingLink::Folder {
            folder: linked,
            keystore,
            keystore_key,
            ..
        } => {
            assert_eq!(linked, &folder);
            (keystore.clone(), keystore_key.clone())
        }
        other => panic!("expected a folder link, got {other:?}"),
    };

    // The binding in the link matches the registry's shared-folder keystore.
    let binding = env
        .resolver
        .get_or_create_shared_folder_keystore(&folder)
        .await
        .unwrap();
    assert_eq!(binding.storage_url, keystore_url);
    assert_eq!(binding.encryption_key, keystore_key);

    // Both the subtree and the keystore index were granted to the group.
    let granted = env.permissions.granted_resources().await;
    assert!(granted.contains(&folder));
    assert!(granted.contains(&keystore_url));
}

#[tokio::test]
async fn deactivate_deletes_group_then_record() {
    let env = env();
    let file = url("https://pod/example/crypto/a.txt");
    env.encryption.encrypt_file(b"content", &file).await.unwrap();

    let link = env
        .coordinator
        .create_file_sharing_link(&file, AccessModes::read_only())
        .await
        .unwrap();
    let group = SharingLink::parse(&link).unwrap().group().clone();
    assert_eq!(env.coordinator.active_links().await.unwrap().len(), 1);

    env.coordinator.deactivate_link(&link).await.unwrap();

    assert!(!env.groups.group_exists(&group).await);
    assert!(env.coordinator.active_links().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_revocation_keeps_link_visible_for_retry() {
    let env = env();
    let file = url("https://pod/example/crypto/a.txt");
    env.encryption.encrypt_file(b"content", &file).await.unwrap();

    let link = env
        .coordinator
        .create_file_sharing_link(&file, AccessModes::read_only())
        .await
        .unwrap();

    env.groups.fail_next_delete();
    let result = env.coordinator.deactivate_link(&link).await;
    assert!(matches!(result, Err(SharingError::Group(_))));

    // The record survives, so the grant is still visible and retryable.
    assert_eq!(env.coordinator.active_links().await.unwrap().len(), 1);
    env.coordinator.deactivate_link(&link).await.unwrap();
    assert!(env.coordinator.active_links().await.unwrap().is_empty());
}

#[tokio::test]
async fn recipient_accepts_file_link_and_decrypts() {
    let owner = env();
    let file = url("https://pod/example/crypto/a.txt");
    let ciphertext = owner.encryption.encrypt_file(b"for bob", &file).await.unwrap();

    let link = owner
        .coordinator
        .create_file_sharing_link(&file, AccessModes::read_only())
        .await
        .unwrap();

    // Recipient has their own pod root and master password, but shares
    // the same remote store.
    let recipient = env_for(owner.store.clone(), url("https://pod/bob/"), "bobs-password");
    recipient.coordinator.accept_link(&link).await.unwrap();

    let plaintext = recipient.encryption.decrypt_file(&ciphertext, &file).await.unwrap();
    assert_eq!(plaintext, b"for bob");
}

#[tokio::test]
async fn recipient_accepts_folder_link_and_resolves_keys() {
    let owner = env();
    let folder = url("https://pod/example/crypto/shared/");
    let file_a = url("https://pod/example/crypto/shared/a.txt");
    let file_b = url("https://pod/example/crypto/shared/sub/b.txt");
    let blob_a = owner.encryption.encrypt_file(b"aaa", &file_a).await.unwrap();
    owner.encryption.encrypt_file(b"bbb", &file_b).await.unwrap();

    let link = owner
        .coordinator
        .create_folder_sharing_link(&folder, AccessModes::read_only())
        .await
        .unwrap();

    let recipient = env_for(owner.store.clone(), url("https://pod/bob/"), "bobs-password");
    recipient.coordinator.accept_link(&link).await.unwrap();

    assert_eq!(
        recipient.resolver.get_key(&file_a).await.unwrap(),
        owner.resolver.get_key(&file_a).await.unwrap()
    );
    assert_eq!(
        recipient.resolver.get_key(&file_b).await.unwrap(),
        owner.resolver.get_key(&file_b).await.unwrap()
    );
    assert_eq!(
        recipient.encryption.decrypt_file(&blob_a, &file_a).await.unwrap(),
        b"aaa"
    );
}

#[tokio::test]
async fn accepting_a_malformed_link_fails() {
    let env = env();
    let result = env
        .coordinator
        .accept_link(&url("https://app.podlock.dev/share?bogus=1"))
        .await;
    assert!(matches!(result, Err(SharingError::InvalidLink(_))));
}

#[tokio::test]
async fn active_links_records_target_and_group() {
    let env = env();
    let file = url("https://pod/example/crypto/a.txt");
    env.encryption.encrypt_file(b"content", &file).await.unwrap();

    let link = env
        .coordinator
        .create_file_sharing_link(&file, AccessModes::read_only())
        .await
        .unwrap();

    let records = env.coordinator.active_links().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].link, link);
    assert_eq!(records[0].target, file);
    assert_eq!(records[0].group, *SharingLink::parse(&link).unwrap().group());
}
