#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub struct Sidecar {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    next_id: u64,
}

impl Sidecar {
    pub fn spawn() -> Self {
        let exe = env!("CARGO_BIN_EXE_resultsd");
        let mut child = Command::new(exe)
            .env_remove("RESULTSD_WORKSPACE")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn resultsd");
        let stdin = child.stdin.take().expect("child stdin");
        let stdout = child.stdout.take().expect("child stdout");
        Self {
            child,
            stdin,
            reader: BufReader::new(stdout),
            next_id: 0,
        }
    }

    pub fn send_raw(&mut self, line: &str) -> serde_json::Value {
        writeln!(self.stdin, "{}", line).expect("write request");
        self.stdin.flush().expect("flush request");
        let mut out = String::new();
        self.reader.read_line(&mut out).expect("read response line");
        assert!(!out.trim().is_empty(), "empty response for {}", line);
        serde_json::from_str(out.trim()).expect("parse response json")
    }

    pub fn request(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        let payload = json!({ "id": id, "method": method, "params": params });
        let value = self.send_raw(&payload.to_string());
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id.as_str()));
        value
    }

    pub fn request_ok(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        let value = self.request(method, params);
        assert!(
            value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
            "{} failed: {}",
            method,
            value
        );
        value.get("result").cloned().unwrap_or_else(|| json!({}))
    }

    pub fn request_err(&mut self, method: &str, params: serde_json::Value) -> String {
        let value = self.request(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            value
        );
        value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    }
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn str_field(v: &serde_json::Value, key: &str) -> String {
    v.get(key)
        .and_then(|x| x.as_str())
        .unwrap_or_else(|| panic!("missing {} in {}", key, v))
        .to_string()
}

/// A PCM-style class with three principal subjects plus General Studies,
/// three students and one exam.
pub struct Fixture {
    pub workspace: PathBuf,
    pub class_id: String,
    pub exam_id: String,
    pub phy: String,
    pub che: String,
    pub mat: String,
    pub gs: String,
    pub amina: String,
    pub baraka: String,
    pub neema: String,
}

pub fn seed_fixture(sc: &mut Sidecar, prefix: &str) -> Fixture {
    let workspace = temp_dir(prefix);
    sc.request_ok(
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let class = sc.request_ok("classes.create", json!({ "name": "Form Six PCM" }));
    let class_id = str_field(&class, "classId");

    let mut subject = |code: &str, name: &str, principal: bool| {
        let r = sc.request_ok(
            "subjects.create",
            json!({ "classId": class_id, "code": code, "name": name, "isPrincipal": principal }),
        );
        str_field(&r, "subjectId")
    };
    let phy = subject("PHY", "Physics", true);
    let che = subject("CHE", "Chemistry", true);
    let mat = subject("MAT", "Mathematics", true);
    let gs = subject("GS", "General Studies", false);

    let mut student = |last: &str, first: &str| {
        let r = sc.request_ok(
            "students.create",
            json!({ "classId": class_id, "lastName": last, "firstName": first }),
        );
        str_field(&r, "studentId")
    };
    let amina = student("Juma", "Amina");
    let baraka = student("Mushi", "Baraka");
    let neema = student("Kimaro", "Neema");

    let exam = sc.request_ok(
        "exams.create",
        json!({ "classId": class_id, "name": "Terminal", "term": 1, "year": 2026 }),
    );
    let exam_id = str_field(&exam, "examId");

    let edit = |student: &str, subject: &str, marks: serde_json::Value| {
        json!({ "studentId": student, "subjectId": subject, "marks": marks })
    };
    let res = sc.request_ok(
        "marks.bulkUpsert",
        json!({
            "examId": exam_id,
            "edits": [
                edit(&amina, &phy, json!(85)),
                edit(&amina, &che, json!(78)),
                edit(&amina, &mat, json!(92)),
                edit(&amina, &gs, json!(75)),
                edit(&baraka, &phy, json!(55)),
                edit(&baraka, &che, json!("45")),
                edit(&baraka, &mat, json!(62)),
                edit(&baraka, &gs, json!(40)),
                edit(&neema, &phy, json!(30)),
                edit(&neema, &che, json!(null)),
                edit(&neema, &mat, json!(70)),
                edit(&neema, &gs, json!(81)),
            ]
        }),
    );
    assert_eq!(res["updated"], json!(12), "seed marks: {}", res);
    assert_eq!(res["rejected"], json!([]));

    Fixture {
        workspace,
        class_id,
        exam_id,
        phy,
        che,
        mat,
        gs,
        amina,
        baraka,
        neema,
    }
}

pub fn student_row<'a>(class: &'a serde_json::Value, student_id: &str) -> &'a serde_json::Value {
    class["students"]
        .as_array()
        .expect("students array")
        .iter()
        .find(|s| s["studentId"] == json!(student_id))
        .unwrap_or_else(|| panic!("student {} missing", student_id))
}
