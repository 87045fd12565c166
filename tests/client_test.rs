//! Tests for DriveClient with mocked HTTP responses.

mod common;

use mockito::{Matcher, Server};
use serde_json::json;
use tekdrive::models::{MemberIdentity, Node, SharingType, TreeOptions};
use tekdrive::{DriveClient, DriveError};

use common::ACCESS_KEY;

mod construction {
    use super::*;

    #[test]
    fn test_missing_access_key() {
        let err = DriveClient::new("").unwrap_err();
        assert!(matches!(
            err,
            DriveError::Client(ref msg) if msg == "Missing required attribute 'access_key'."
        ));
    }

    #[test]
    fn test_header_unsafe_access_key() {
        let err = DriveClient::new("bad\nkey").unwrap_err();
        assert!(matches!(err, DriveError::InvalidAuthorizer(_)));
    }
}

mod files {
    use super::*;

    #[tokio::test]
    async fn test_create_then_upload_reuses_upload_url() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let create = server
            .mock("POST", "/file")
            .match_header("x-is-ak", ACCESS_KEY)
            .match_body(Matcher::Json(json!({"name": "data.bin", "parentFolderId": "d1"})))
            .with_status(201)
            .with_body(
                json!({
                    "file": {"id": "f1", "name": "data.bin", "parentFolderId": "d1"},
                    "uploadUrl": format!("{base}/storage/put/f1")
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/storage/put/f1")
            .match_header("content-type", "application/octet-stream")
            .match_header("x-is-ak", Matcher::Missing)
            .match_body("hello")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let upload_url = server
            .mock("GET", "/file/f1/uploadUrl")
            .with_status(200)
            .with_body(json!({"uploadUrl": format!("{base}/storage/put/f1/again")}).to_string())
            .expect(1)
            .create_async()
            .await;
        let put_again = server
            .mock("PUT", "/storage/put/f1/again")
            .match_body("world")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        let folder = client.folder("d1");
        let file = folder.upload("data.bin", "hello").await.unwrap();
        assert_eq!(file.id(), "f1");
        create.assert_async().await;
        put.assert_async().await;

        // The handed-out URL is used once; later uploads ask for a new one.
        file.upload("world").await.unwrap();
        upload_url.assert_async().await;
        put_again.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_upload_url() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let _create = server
            .mock("POST", "/file")
            .with_status(201)
            .with_body(
                json!({
                    "file": {"id": "f1", "name": "data.bin"},
                    "uploadUrl": format!("{base}/storage/put/f1")
                })
                .to_string(),
            )
            .create_async()
            .await;
        let rejected = server
            .mock("PUT", "/storage/put/f1")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let accepted = server
            .mock("PUT", "/storage/put/f1")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let upload_url = server
            .mock("GET", "/file/f1/uploadUrl")
            .expect(0)
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        let file = client.files().create("data.bin", None).await.unwrap();

        let err = file.upload("hello").await.unwrap_err();
        assert!(matches!(err, DriveError::Storage(_)), "unexpected error: {err:?}");
        assert_eq!(
            file.upload_url().await.unwrap(),
            format!("{base}/storage/put/f1")
        );

        file.upload("hello").await.unwrap();
        assert!(file.upload_url().await.is_err());

        rejected.assert_async().await;
        accepted.assert_async().await;
        upload_url.assert_async().await;
    }

    #[tokio::test]
    async fn test_download_to_file() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let _link = server
            .mock("GET", "/file/f1/downloadUrl")
            .with_status(200)
            .with_body(json!({"downloadUrl": format!("{base}/storage/get/f1")}).to_string())
            .create_async()
            .await;
        let _content = server
            .mock("GET", "/storage/get/f1")
            .with_status(200)
            .with_body("file contents")
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");

        let written = client.file("f1").download_to(&target).await.unwrap();
        assert_eq!(written, 13);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "file contents");
    }

    #[tokio::test]
    async fn test_storage_failure() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let _link = server
            .mock("GET", "/file/f1/downloadUrl")
            .with_status(200)
            .with_body(json!({"downloadUrl": format!("{base}/storage/get/f1")}).to_string())
            .create_async()
            .await;
        let _content = server
            .mock("GET", "/storage/get/f1")
            .with_status(403)
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        let err = client.file("f1").download().await.unwrap_err();
        assert!(matches!(err, DriveError::Storage(_)), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_upload_missing_local_file() {
        let (client, _) = common::client("http://127.0.0.1:1");
        let err = client
            .files()
            .upload_path("/definitely/not/here.bin", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::Client(ref msg) if msg.contains("does not exist")));
    }

    #[tokio::test]
    async fn test_move_and_rename() {
        let mut server = Server::new_async().await;
        let moved = server
            .mock("PUT", "/file/f1")
            .match_body(Matcher::Json(json!({"parentFolderId": "d2"})))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;
        let renamed = server
            .mock("PUT", "/file/f1")
            .match_body(Matcher::Json(json!({"name": "final.txt"})))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        let file = client.file("f1");
        file.move_to("d2").await.unwrap();
        assert_eq!(file.parent_folder_id().await.unwrap().as_deref(), Some("d2"));

        file.rename("final.txt").await.unwrap();
        assert_eq!(file.name().await.unwrap(), "final.txt");

        moved.assert_async().await;
        renamed.assert_async().await;
    }

    #[tokio::test]
    async fn test_share_file() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/file/f1/members")
            .match_body(Matcher::Json(json!({
                "username": "friend@example.com",
                "permissions": {"read": true, "edit": false}
            })))
            .with_status(201)
            .with_body(
                json!({
                    "id": "m1",
                    "username": "friend@example.com",
                    "permissions": {"read": true, "edit": false}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        let member = client.file("f1").share("friend@example.com", false).await.unwrap();
        assert_eq!(member.id(), "m1");
        mock.assert_async().await;
    }
}

mod folders {
    use super::*;

    #[tokio::test]
    async fn test_members_have_parent() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/folder/d1/members")
            .with_status(200)
            .with_body(
                json!({"members": [
                    {"id": "m1", "username": "a@example.com", "permissions": {"read": true, "edit": true}}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        let folder = client.folder("d1");
        let members = folder.members().await.unwrap();

        assert_eq!(members.len(), 1);
        match members.parent() {
            Some(Node::Folder(parent)) => assert!(parent.ptr_eq(&folder)),
            other => panic!("unexpected parent: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_member_management() {
        let mut server = Server::new_async().await;
        let add = server
            .mock("POST", "/folder/d1/members")
            .match_body(Matcher::Json(json!({
                "username": "new@example.com",
                "permissions": {"read": true, "edit": true}
            })))
            .with_status(201)
            .with_body(
                json!({"id": "m2", "username": "new@example.com", "permissions": {"read": true, "edit": true}})
                    .to_string(),
            )
            .create_async()
            .await;
        let modify = server
            .mock("PUT", "/folder/d1/members/m2")
            .match_body(Matcher::Json(json!({"permissions": {"read": true, "edit": false}})))
            .with_status(200)
            .with_body(
                json!({"id": "m2", "username": "new@example.com", "permissions": {"read": true, "edit": false}})
                    .to_string(),
            )
            .create_async()
            .await;
        let remove = server
            .mock("DELETE", "/folder/d1/members/m2")
            .with_status(204)
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        let folder = client.folder("d1");

        let identity = MemberIdentity::from_parts(None, Some("new@example.com".to_string())).unwrap();
        let member = folder.add_member(identity, true).await.unwrap();
        assert!(member.permissions().await.unwrap().edit);

        let member = folder.modify_member(member.id(), false).await.unwrap();
        assert!(!member.permissions().await.unwrap().edit);

        folder.remove_member(member.id()).await.unwrap();

        add.assert_async().await;
        modify.assert_async().await;
        remove.assert_async().await;
    }

    #[test]
    fn test_member_identity_required() {
        let err = MemberIdentity::from_parts(None, None).unwrap_err();
        assert!(matches!(err, DriveError::Client(ref msg) if msg == "Must supply `username` or `user_id`."));
        assert_eq!(
            MemberIdentity::from_parts(Some("u1".into()), Some("x@example.com".into())).unwrap(),
            MemberIdentity::UserId("u1".into())
        );
    }

    #[tokio::test]
    async fn test_create_folder() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/folder")
            .match_body(Matcher::Json(json!({"name": "Reports"})))
            .with_status(201)
            .with_body(json!({"id": "d9", "type": "FOLDER", "name": "Reports", "folderType": "STANDARD"}).to_string())
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        let folder = client.folders().create("Reports", None).await.unwrap();
        assert_eq!(folder.id(), "d9");
        assert_eq!(folder.name().await.unwrap(), "Reports");
        mock.assert_async().await;
    }
}

mod tree {
    use super::*;

    #[tokio::test]
    async fn test_tree_listing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/tree")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("folderId".into(), "root".into()),
                Matcher::UrlEncoded("depth".into(), "2".into()),
                Matcher::UrlEncoded("foldersOnly".into(), "false".into()),
                Matcher::UrlEncoded("includeTrashed".into(), "false".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({"tree": {
                    "id": "root", "type": "FOLDER", "name": "Home",
                    "children": [
                        {"id": "f1", "type": "FILE", "name": "a.txt"},
                        {"id": "d1", "type": "FOLDER", "name": "Sub", "children": []}
                    ]
                }})
                .to_string(),
            )
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        let options = TreeOptions {
            depth: Some(2),
            ..TreeOptions::folder("root")
        };
        let root = client.tree().get(&options).await.unwrap();

        assert_eq!(root.name().await.unwrap(), "Home");
        let children = root.children().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].as_folder().unwrap().children().unwrap().len(), 0);
        mock.assert_async().await;
    }
}

mod account {
    use super::*;

    #[tokio::test]
    async fn test_me() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/user")
            .with_status(200)
            .with_body(
                json!({
                    "id": "u1",
                    "username": "me@example.com",
                    "accountId": "acc-1",
                    "ownerType": "USER",
                    "createdAt": "2021-01-01T00:00:00.000Z",
                    "plan": {
                        "id": "pln_small",
                        "name": "Small",
                        "limits": {"storageSizeLimit": "2000000000", "sharingType": "DISABLED"}
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        let me = client.user().me().await.unwrap();
        assert_eq!(me.username().await.unwrap(), "me@example.com");
        assert_eq!(me.plan().await.unwrap().sharing_type, SharingType::Disabled);
    }

    #[tokio::test]
    async fn test_usage() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/user/usage")
            .with_status(200)
            .with_body(
                json!({
                    "totalBytesOwned": "1500",
                    "filesOwnedCount": 3,
                    "totalBytesOwnedInTrash": "500",
                    "filesOwnedInTrashCount": 1,
                    "totalBytesCreated": "1500",
                    "filesCreatedCount": 3,
                    "storageSizeLimit": "1000"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        let usage = client.user().usage().await.unwrap();
        assert_eq!(usage.storage_used(), 1500);
        assert_eq!(usage.storage_freeable(), 500);
        assert_eq!(usage.storage_remaining(), -500);
    }
}
