// End-to-end tests: a real server on loopback, driven by a minimal client.

use crate::config::Config;
use crate::core_auth::PasswdFile;
use crate::core_network::network::start_server;
use crate::server::ServerContext;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);

struct TestServer {
    addr: SocketAddr,
    root: TempDir,
    _state: TempDir,
}

impl TestServer {
    async fn start() -> TestServer {
        let root = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();

        let mut config = Config::default();
        config.server.root_dir = root.path().to_path_buf();
        config.server.passwd_file = state.path().join("passwd");
        config.server.data_timeout_secs = 5;

        let credentials = Arc::new(PasswdFile::new(config.server.passwd_file.clone()));
        let ctx = Arc::new(ServerContext::new(config, credentials).unwrap());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(start_server(listener, ctx));

        TestServer {
            addr,
            root,
            _state: state,
        }
    }

    async fn connect(&self) -> Client {
        let stream = TcpStream::connect(self.addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        let mut client = Client {
            reader: BufReader::new(reader),
            writer,
        };
        assert!(client.reply().await.starts_with("220 "));
        client
    }

    async fn logged_in(&self) -> Client {
        let mut client = self.connect().await;
        assert!(client.command("USER anonymous").await.starts_with("331 "));
        assert!(client.command("PASS guest@example.org").await.starts_with("230 "));
        client
    }
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
    }

    /// Reads one complete reply and returns its final line.
    async fn reply(&mut self) -> String {
        let mut first = String::new();
        timeout(WAIT, self.reader.read_line(&mut first))
            .await
            .expect("timed out waiting for reply")
            .unwrap();
        let first = first.trim_end().to_string();
        if first.as_bytes().get(3) != Some(&b'-') {
            return first;
        }

        let terminator = format!("{} ", &first[..3]);
        loop {
            let mut line = String::new();
            timeout(WAIT, self.reader.read_line(&mut line))
                .await
                .expect("timed out waiting for reply")
                .unwrap();
            if line.starts_with(&terminator) {
                return line.trim_end().to_string();
            }
        }
    }

    async fn command(&mut self, line: &str) -> String {
        self.send(line).await;
        self.reply().await
    }

    /// Sends PASV and connects to the announced port.
    async fn passive(&mut self) -> (TcpStream, u16) {
        let reply = self.command("PASV").await;
        assert!(reply.starts_with("227 "), "{}", reply);
        let port = pasv_port(&reply);
        let data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        (data, port)
    }

    async fn closed(&mut self) -> bool {
        let mut rest = String::new();
        matches!(
            timeout(WAIT, self.reader.read_line(&mut rest)).await,
            Ok(Ok(0)) | Ok(Err(_))
        )
    }
}

fn pasv_port(reply: &str) -> u16 {
    let start = reply.find('(').unwrap() + 1;
    let end = reply.find(')').unwrap();
    let fields: Vec<u16> = reply[start..end]
        .split(',')
        .map(|f| f.parse().unwrap())
        .collect();
    assert_eq!(fields.len(), 6);
    fields[4] * 256 + fields[5]
}

async fn read_all(mut data: TcpStream) -> Vec<u8> {
    let mut received = Vec::new();
    timeout(WAIT, data.read_to_end(&mut received))
        .await
        .expect("timed out reading data connection")
        .unwrap();
    received
}

#[tokio::test]
async fn test_anonymous_login_and_empty_download() {
    let server = TestServer::start().await;
    std::fs::write(server.root.path().join("empty.bin"), b"").unwrap();

    let mut client = server.logged_in().await;
    let (data, port) = client.passive().await;
    assert!(port >= 20000);

    assert!(client.command("RETR empty.bin").await.starts_with("150 "));
    assert!(read_all(data).await.is_empty());
    assert_eq!(client.reply().await, "226 Transfer complete.");
}

#[tokio::test]
async fn test_commands_before_login_are_refused() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    assert_eq!(client.command("PWD").await, "530 Please login with USER and PASS.");
    assert_eq!(client.command("PASS early").await, "530 Please login with USER and PASS.");
    assert_eq!(client.command("FEAT").await, "530 Please login with USER and PASS.");

    assert!(client.command("USER someone").await.starts_with("331 "));
    assert_eq!(client.command("LIST").await, "530 Please login with USER and PASS.");
    assert!(client.command("PASS secret").await.starts_with("230 "));
    assert!(client.command("PWD").await.starts_with("257 "));
}

#[tokio::test]
async fn test_invalid_user_name_is_rejected() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    assert_eq!(client.command("USER bad:name").await, "501 Invalid user name.");
    assert_eq!(client.command("PASS x").await, "530 Please login with USER and PASS.");
}

#[tokio::test]
async fn test_wrong_password_keeps_waiting_for_pass() {
    let server = TestServer::start().await;

    let mut first = server.connect().await;
    assert!(first.command("USER carol").await.starts_with("331 "));
    assert!(first.command("PASS right").await.starts_with("230 "));

    let mut second = server.connect().await;
    assert!(second.command("USER carol").await.starts_with("331 "));
    assert_eq!(second.command("PASS wrong").await, "530 Login incorrect.");
    assert!(second.command("PASS right").await.starts_with("230 "));
}

#[tokio::test]
async fn test_unknown_and_login_verbs_after_login() {
    let server = TestServer::start().await;
    let mut client = server.logged_in().await;

    assert_eq!(client.command("FEAT").await, "502 Command not implemented: FEAT");
    assert_eq!(client.command("USER other").await, "502 Command not implemented: USER");
    assert_eq!(client.command("SYST").await, "215 UNIX Type: L8");
    assert_eq!(client.command("TYPE I").await, "200 Type set to I.");
    assert!(client.command("TYPE A").await.starts_with("504 "));
}

#[tokio::test]
async fn test_overlong_line_is_rejected_and_session_continues() {
    let server = TestServer::start().await;
    let mut client = server.logged_in().await;

    let long = format!("CWD {}", "a".repeat(2000));
    assert_eq!(client.command(&long).await, "500 Command line too long.");
    assert_eq!(client.command("PWD").await, "257 \"/\" is the current directory.");
}

#[tokio::test]
async fn test_port_replaces_pasv_and_closes_its_listener() {
    let server = TestServer::start().await;
    std::fs::write(server.root.path().join("one.txt"), b"1").unwrap();
    let mut client = server.logged_in().await;

    let reply = client.command("PASV").await;
    let passive_port = pasv_port(&reply);

    let active = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = active.local_addr().unwrap().port();
    let port_cmd = format!("PORT 127,0,0,1,{},{}", port / 256, port % 256);
    assert_eq!(client.command(&port_cmd).await, "200 PORT command successful.");

    assert!(TcpStream::connect(("127.0.0.1", passive_port)).await.is_err());

    assert!(client.command("LIST").await.starts_with("150 "));
    let (data, _) = timeout(WAIT, active.accept()).await.unwrap().unwrap();
    let listing = String::from_utf8(read_all(data).await).unwrap();
    assert!(listing.contains("one.txt"));
    assert_eq!(client.reply().await, "226 Directory send OK.");
}

#[tokio::test]
async fn test_bad_port_argument_sets_no_mode() {
    let server = TestServer::start().await;
    let mut client = server.logged_in().await;

    assert!(client.command("PORT 1,2,3").await.starts_with("501 "));
    assert_eq!(client.command("STOR x.bin").await, "425 Use PORT or PASV first.");
}

#[tokio::test]
async fn test_transfer_commands_need_a_data_mode() {
    let server = TestServer::start().await;
    std::fs::write(server.root.path().join("file.bin"), b"data").unwrap();
    let mut client = server.logged_in().await;

    assert_eq!(client.command("RETR file.bin").await, "425 Can't open data connection.");
    assert_eq!(client.command("LIST").await, "425 Can't open data connection.");
    assert_eq!(client.command("STOR new.bin").await, "425 Use PORT or PASV first.");
    assert!(!server.root.path().join("new.bin").exists());
}

#[tokio::test]
async fn test_retr_and_size_refuse_missing_and_directories() {
    let server = TestServer::start().await;
    std::fs::create_dir(server.root.path().join("dir")).unwrap();
    let mut client = server.logged_in().await;

    assert!(client.command("RETR missing.bin").await.starts_with("550 "));
    assert!(client.command("RETR dir").await.starts_with("550 "));
    assert!(client.command("SIZE missing.bin").await.starts_with("550 "));
    assert!(client.command("SIZE dir").await.starts_with("550 "));
}

#[tokio::test]
async fn test_upload_then_download() {
    let server = TestServer::start().await;
    let mut client = server.logged_in().await;
    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

    let (mut data, _) = client.passive().await;
    assert!(client.command("STOR blob.bin").await.starts_with("150 "));
    data.write_all(&payload).await.unwrap();
    drop(data);
    assert_eq!(client.reply().await, "226 Transfer complete.");
    assert_eq!(client.command("SIZE blob.bin").await, "213 200000");

    let (data, _) = client.passive().await;
    assert!(client.command("RETR blob.bin").await.starts_with("150 "));
    assert_eq!(read_all(data).await, payload);
    assert_eq!(client.reply().await, "226 Transfer complete.");
}

#[tokio::test]
async fn test_rest_then_stor_overwrites_from_offset() {
    let server = TestServer::start().await;
    let path = server.root.path().join("data.bin");
    std::fs::write(&path, vec![b'a'; 150]).unwrap();
    let mut client = server.logged_in().await;

    assert!(client.command("REST 100").await.starts_with("350 "));
    let (mut data, _) = client.passive().await;
    assert!(client.command("STOR data.bin").await.starts_with("150 "));
    data.write_all(&[b'b'; 20]).await.unwrap();
    drop(data);
    assert_eq!(client.reply().await, "226 Transfer complete.");

    assert_eq!(client.command("SIZE data.bin").await, "213 120");
    let content = std::fs::read(&path).unwrap();
    assert_eq!(&content[..100], &[b'a'; 100][..]);
    assert_eq!(&content[100..], &[b'b'; 20][..]);

    // The offset was used up, so this upload replaces the file.
    let (mut data, _) = client.passive().await;
    assert!(client.command("STOR data.bin").await.starts_with("150 "));
    data.write_all(b"x").await.unwrap();
    drop(data);
    assert_eq!(client.reply().await, "226 Transfer complete.");
    assert_eq!(client.command("SIZE data.bin").await, "213 1");
}

#[tokio::test]
async fn test_rest_beyond_end_is_rejected() {
    let server = TestServer::start().await;
    std::fs::write(server.root.path().join("short.bin"), b"abc").unwrap();
    let mut client = server.logged_in().await;

    assert_eq!(client.command("REST nope").await, "501 Invalid offset.");
    assert!(client.command("REST 500").await.starts_with("350 "));
    let (_data, _) = client.passive().await;
    assert_eq!(client.command("STOR short.bin").await, "501 Invalid offset.");
    assert_eq!(std::fs::read(server.root.path().join("short.bin")).unwrap(), b"abc");
}

#[tokio::test]
async fn test_rest_then_retr_starts_at_offset() {
    let server = TestServer::start().await;
    std::fs::write(server.root.path().join("digits.txt"), b"0123456789").unwrap();
    let mut client = server.logged_in().await;

    assert!(client.command("REST 4").await.starts_with("350 "));
    let (data, _) = client.passive().await;
    assert!(client.command("RETR digits.txt").await.starts_with("150 "));
    assert_eq!(read_all(data).await, b"456789");
    assert_eq!(client.reply().await, "226 Transfer complete.");

    let (data, _) = client.passive().await;
    assert!(client.command("RETR digits.txt").await.starts_with("150 "));
    assert_eq!(read_all(data).await, b"0123456789");
    assert_eq!(client.reply().await, "226 Transfer complete.");
}

#[tokio::test]
async fn test_resume_download_keeps_offset() {
    let server = TestServer::start().await;
    std::fs::write(server.root.path().join("digits.txt"), b"0123456789").unwrap();
    let mut client = server.logged_in().await;

    assert!(client.command("REST 4").await.starts_with("350 "));
    for _ in 0..2 {
        let (data, _) = client.passive().await;
        assert!(client.command("RETR digits.txt -resume").await.starts_with("150 "));
        assert_eq!(read_all(data).await, b"456789");
        assert_eq!(client.reply().await, "226 Transfer complete.");
    }

    // A plain RETR still honours the kept offset, then clears it.
    let (data, _) = client.passive().await;
    assert!(client.command("RETR digits.txt").await.starts_with("150 "));
    assert_eq!(read_all(data).await, b"456789");
    assert_eq!(client.reply().await, "226 Transfer complete.");

    let (data, _) = client.passive().await;
    assert!(client.command("RETR digits.txt").await.starts_with("150 "));
    assert_eq!(read_all(data).await, b"0123456789");
    assert_eq!(client.reply().await, "226 Transfer complete.");
}

#[tokio::test]
async fn test_resume_upload_writes_in_place() {
    let server = TestServer::start().await;
    let path = server.root.path().join("up.bin");
    std::fs::write(&path, b"aaaaaaaaaa").unwrap();
    let mut client = server.logged_in().await;

    assert!(client.command("REST 4").await.starts_with("350 "));
    let (mut data, _) = client.passive().await;
    assert!(client.command("STOR up.bin -resume").await.starts_with("150 "));
    data.write_all(b"ZZ").await.unwrap();
    drop(data);
    assert_eq!(client.reply().await, "226 Transfer complete.");
    assert_eq!(std::fs::read(&path).unwrap(), b"aaaaZZaaaa");

    // The offset is kept for the next resumed upload.
    let (mut data, _) = client.passive().await;
    assert!(client.command("STOR up.bin -resume").await.starts_with("150 "));
    data.write_all(b"Y").await.unwrap();
    drop(data);
    assert_eq!(client.reply().await, "226 Transfer complete.");
    assert_eq!(std::fs::read(&path).unwrap(), b"aaaaYZaaaa");
    assert_eq!(client.command("SIZE up.bin").await, "213 10");
}

#[tokio::test]
async fn test_resume_upload_needs_existing_file() {
    let server = TestServer::start().await;
    let mut client = server.logged_in().await;

    let (_data, _) = client.passive().await;
    assert_eq!(
        client.command("STOR missing.bin -resume").await,
        "550 Failed to open file."
    );
    assert!(!server.root.path().join("missing.bin").exists());
}

#[tokio::test]
async fn test_concurrent_upload_is_refused() {
    let server = TestServer::start().await;
    let path = server.root.path().join("shared.bin");
    std::fs::write(&path, b"original").unwrap();

    let mut writer = server.logged_in().await;
    let (mut data, _) = writer.passive().await;
    assert!(writer.command("STOR shared.bin").await.starts_with("150 "));

    let mut rival = server.logged_in().await;
    let (_rival_data, _) = rival.passive().await;
    assert_eq!(
        rival.command("STOR shared.bin").await,
        "550 File is currently being written by another client."
    );

    data.write_all(b"new content").await.unwrap();
    drop(data);
    assert_eq!(writer.reply().await, "226 Transfer complete.");
    assert_eq!(std::fs::read(&path).unwrap(), b"new content");
}

#[tokio::test]
async fn test_busy_reply_and_abort_during_upload() {
    let server = TestServer::start().await;
    let mut client = server.logged_in().await;

    let (mut data, _) = client.passive().await;
    assert!(client.command("STOR slow.bin").await.starts_with("150 "));
    data.write_all(b"partial").await.unwrap();

    assert_eq!(
        client.command("PWD").await,
        "425 Unable to process command during transfer."
    );

    client.send("ABOR").await;
    assert_eq!(client.reply().await, "426 Connection closed; transfer aborted.");
    assert_eq!(client.reply().await, "226 ABOR command successful.");

    let mut buf = [0u8; 16];
    let n = timeout(WAIT, data.read(&mut buf)).await.unwrap().unwrap_or(0);
    assert_eq!(n, 0);

    assert!(client.command("PWD").await.starts_with("257 "));
}

#[tokio::test]
async fn test_quit_during_upload_closes_session() {
    let server = TestServer::start().await;
    let mut client = server.logged_in().await;

    let (_data, _) = client.passive().await;
    assert!(client.command("STOR pending.bin").await.starts_with("150 "));
    assert!(client.command("QUIT").await.starts_with("221 "));
    assert!(client.closed().await);
}

#[tokio::test]
async fn test_abor_without_transfer() {
    let server = TestServer::start().await;
    let mut client = server.logged_in().await;
    assert_eq!(client.command("ABOR").await, "226 ABOR command successful.");
}

#[tokio::test]
async fn test_quit_before_login() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    assert_eq!(client.command("QUIT").await, "221 Goodbye.");
    assert!(client.closed().await);
}

#[tokio::test]
async fn test_cwd_into_search_only_directory() {
    use std::os::unix::fs::PermissionsExt;

    let server = TestServer::start().await;
    let dir = server.root.path().join("dropbox");
    std::fs::create_dir(&dir).unwrap();
    std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o100)).unwrap();
    let mut client = server.logged_in().await;

    let reply = client.command("CWD dropbox").await;
    std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();
    assert_eq!(reply, "250 Directory changed to \"/dropbox\".");
}

#[tokio::test]
async fn test_directory_navigation_stays_in_jail() {
    let server = TestServer::start().await;
    let mut client = server.logged_in().await;

    assert_eq!(client.command("MKD sub").await, "257 \"sub\" created.");
    assert!(client.command("MKD sub").await.starts_with("550 "));
    assert_eq!(client.command("CWD sub").await, "250 Directory changed to \"/sub\".");
    assert_eq!(client.command("PWD").await, "257 \"/sub\" is the current directory.");

    assert!(client.command("CWD ../../..").await.starts_with("250 "));
    assert_eq!(client.command("PWD").await, "257 \"/\" is the current directory.");

    assert!(client.command("CWD missing").await.starts_with("550 "));
    assert_eq!(client.command("PWD").await, "257 \"/\" is the current directory.");

    assert!(client.command("MKD ../../escape").await.starts_with("257 "));
    assert!(server.root.path().join("escape").is_dir());

    assert!(client.command("CWD /sub").await.starts_with("250 "));
    assert!(client.command("CWD .").await.starts_with("250 "));
    assert!(client.command("CWD ..").await.starts_with("250 "));
    assert_eq!(client.command("PWD").await, "257 \"/\" is the current directory.");
}

#[tokio::test]
async fn test_remove_directory() {
    let server = TestServer::start().await;
    std::fs::create_dir_all(server.root.path().join("full/inner")).unwrap();
    std::fs::create_dir(server.root.path().join("empty")).unwrap();
    let mut client = server.logged_in().await;

    assert_eq!(client.command("RMD /").await, "550 Cannot remove the root directory.");
    assert_eq!(client.command("RMD ..").await, "550 Cannot remove the root directory.");
    assert!(client.command("RMD full").await.starts_with("550 "));
    assert!(server.root.path().join("full").is_dir());

    assert_eq!(
        client.command("RMD empty").await,
        "250 Directory \"empty\" removed successfully."
    );
    assert!(!server.root.path().join("empty").exists());
    assert_eq!(client.command("RMD empty").await, "550 Directory does not exist.");
}

#[tokio::test]
async fn test_list_formats_sorted_visible_entries() {
    let server = TestServer::start().await;
    std::fs::write(server.root.path().join("b.txt"), b"bb").unwrap();
    std::fs::write(server.root.path().join("a.txt"), b"a").unwrap();
    std::fs::write(server.root.path().join(".hidden"), b"h").unwrap();
    let mut client = server.logged_in().await;

    let (data, _) = client.passive().await;
    assert_eq!(
        client.command("LIST -la").await,
        "150 Here comes the directory listing."
    );
    let listing = String::from_utf8(read_all(data).await).unwrap();
    assert_eq!(client.reply().await, "226 Directory send OK.");

    assert!(listing.ends_with("\r\n"));
    let lines: Vec<&str> = listing.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("total "));
    assert!(lines[1].starts_with('-') && lines[1].ends_with(" a.txt"));
    assert!(lines[2].ends_with(" b.txt"));
    assert!(!listing.contains(".hidden"));

    let (data, _) = client.passive().await;
    assert!(client.command("LIST b.txt").await.starts_with("150 "));
    let single = String::from_utf8(read_all(data).await).unwrap();
    assert_eq!(client.reply().await, "226 Directory send OK.");
    assert_eq!(single.lines().count(), 1);
    assert!(single.trim_end().ends_with(" b.txt"));

    assert!(client.command("LIST nowhere").await.starts_with("550 "));
}
