//! Round trips of derived object types through an encoder and decoder.

use std::collections::HashMap;

use hessian_core::{
    from_bytes_as, to_bytes, Decoder, Encoder, HessianError, TypeRegistry, Value,
};
use hessian_derive::Hessian;

#[derive(Debug, Clone, Default, PartialEq, Hessian)]
#[hessian(class_name = "com.bdt.info.Department")]
pub struct Department {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Hessian)]
#[hessian(class_name = "com.bdt.info.WorkerInfo")]
pub struct WorkerInfo {
    unexported_field: String,
    pub name: String,
    pub addrress: String,
    pub age: i64,
    pub salary: f32,
    pub payload: HashMap<String, i32>,
    #[hessian(field_name = "familyMembers1")]
    pub family_members: Vec<String>,
    pub family_phone_number: String,
    pub dpt: Department,
}

#[derive(Debug, Clone, Default, PartialEq, Hessian)]
#[hessian(class_name = "com.bdt.info.UserName")]
pub struct UserName {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Hessian)]
#[hessian(class_name = "com.bdt.info.Person")]
pub struct Person {
    #[hessian(flatten)]
    pub user_name: UserName,
    pub age: i32,
    pub sex: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Hessian)]
#[hessian(class_name = "com.bdt.info.JOB")]
pub struct Job {
    pub title: String,
    pub company: String,
}

#[derive(Debug, Clone, Default, PartialEq, Hessian)]
#[hessian(class_name = "com.bdt.info.Worker")]
pub struct Worker {
    #[hessian(flatten)]
    pub person: Person,
    pub cur_job: Job,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Default, PartialEq, Hessian)]
#[hessian(class_name = "com.bdt.info.Account")]
pub struct Account {
    pub r#type: String,
    #[hessian(skip)]
    pub session_token: String,
    pub balance: Option<f64>,
    pub tags: Option<Vec<String>>,
}

fn worker_info() -> WorkerInfo {
    WorkerInfo {
        unexported_field: "you cannot see me!".to_string(),
        name: "Trump".to_string(),
        addrress: "W,D.C.".to_string(),
        age: 72,
        salary: 21000.03,
        payload: HashMap::from([("Number".to_string(), 2017061118)]),
        family_members: vec!["m1".to_string(), "m2".to_string(), "m3".to_string()],
        family_phone_number: "010-12345678".to_string(),
        dpt: Department {
            name: "Adm".to_string(),
        },
    }
}

fn job(title: &str, company: &str) -> Job {
    Job {
        title: title.to_string(),
        company: company.to_string(),
    }
}

fn worker() -> Worker {
    Worker {
        person: Person {
            user_name: UserName {
                first_name: "John".to_string(),
                last_name: "Doe".to_string(),
            },
            age: 18,
            sex: true,
        },
        cur_job: job("cto", "facebook"),
        jobs: vec![job("manager", "google"), job("ceo", "microsoft")],
    }
}

#[test]
fn test_struct_round_trip_drops_unexported_field() {
    let original = worker_info();
    let bytes = to_bytes(&original).unwrap();

    let decoded: WorkerInfo = from_bytes_as(&bytes).unwrap();
    let expected = WorkerInfo {
        unexported_field: String::new(),
        ..original
    };
    assert_eq!(decoded, expected);
}

#[test]
fn test_dynamic_decode_yields_registered_type() {
    TypeRegistry::global().register::<WorkerInfo>().unwrap();
    let bytes = to_bytes(&worker_info()).unwrap();

    let value = Decoder::new(&bytes).decode().unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.class_name(), "com.bdt.info.WorkerInfo");
    let decoded = object.downcast::<WorkerInfo>().unwrap();
    assert_eq!(decoded.borrow().name, "Trump");
    assert_eq!(decoded.borrow().age, 72);
    assert_eq!(decoded.borrow().family_members, vec!["m1", "m2", "m3"]);
    assert_eq!(decoded.borrow().dpt.name, "Adm");
}

#[test]
fn test_empty_struct_round_trip() {
    let bytes = to_bytes(&WorkerInfo::default()).unwrap();
    let decoded: WorkerInfo = from_bytes_as(&bytes).unwrap();
    assert_eq!(decoded, WorkerInfo::default());
}

#[test]
fn test_wire_field_names() {
    let mut encoder = Encoder::new();
    encoder.encode(&worker_info()).unwrap();
    let definition = &encoder.class_definitions()[0];
    assert_eq!(definition.class_name(), "com.bdt.info.WorkerInfo");
    assert_eq!(
        definition.field_names(),
        &[
            "name",
            "addrress",
            "age",
            "salary",
            "payload",
            "familyMembers1",
            "familyPhoneNumber",
            "dpt",
        ]
    );
}

#[test]
fn test_flattened_fields_form_one_definition() {
    let mut encoder = Encoder::new();
    encoder.encode(&worker()).unwrap();

    let definitions = encoder.class_definitions();
    assert_eq!(definitions.len(), 2);
    assert_eq!(definitions[0].class_name(), "com.bdt.info.Worker");
    assert_eq!(
        definitions[0].field_names(),
        &["firstName", "lastName", "age", "sex", "curJob", "jobs"]
    );
    assert_eq!(definitions[1].class_name(), "com.bdt.info.JOB");
}

#[test]
fn test_flattened_round_trip() {
    let original = worker();
    let bytes = to_bytes(&original).unwrap();
    let decoded: Worker = from_bytes_as(&bytes).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn test_object_list_is_typed_with_class_name() {
    let jobs = vec![job("a", "b")];
    let bytes = to_bytes(&jobs).unwrap();
    // 0x71, then the type name as a string of 17 characters
    assert_eq!(bytes[0], 0x71);
    assert_eq!(bytes[1], 17);
    assert_eq!(&bytes[2..19], b"[com.bdt.info.JOB");

    let value = from_bytes_as::<Value>(&bytes).unwrap();
    let list = value.as_list().unwrap().borrow().clone();
    assert_eq!(list.type_name.as_deref(), Some("[com.bdt.info.JOB"));
    assert_eq!(from_bytes_as::<Vec<Job>>(&bytes).unwrap(), jobs);
}

#[test]
fn test_skip_and_raw_identifiers() {
    let account = Account {
        r#type: "savings".to_string(),
        session_token: "secret".to_string(),
        balance: Some(12.5),
        tags: None,
    };
    let mut encoder = Encoder::new();
    encoder.encode(&account).unwrap();
    assert_eq!(
        encoder.class_definitions()[0].field_names(),
        &["type", "balance", "tags"]
    );

    let decoded: Account = from_bytes_as(encoder.buffer()).unwrap();
    assert_eq!(decoded.r#type, "savings");
    assert_eq!(decoded.session_token, "");
    assert_eq!(decoded.balance, Some(12.5));
    assert_eq!(decoded.tags, None);
}

#[test]
fn test_several_objects_on_one_stream() {
    let mut encoder = Encoder::new();
    encoder.encode(&job("manager", "google")).unwrap();
    encoder.encode(&job("ceo", "microsoft")).unwrap();
    encoder.encode(&worker()).unwrap();

    let bytes = encoder.into_bytes();
    let mut decoder = Decoder::new(&bytes);
    assert_eq!(decoder.decode_as::<Job>().unwrap(), job("manager", "google"));
    assert_eq!(decoder.decode_as::<Job>().unwrap(), job("ceo", "microsoft"));
    assert_eq!(decoder.decode_as::<Worker>().unwrap(), worker());
    assert_eq!(decoder.remaining(), 0);
    assert_eq!(decoder.class_definitions().len(), 2);
}

#[test]
fn test_field_type_mismatch() {
    #[derive(Debug, Clone, Default, Hessian)]
    #[hessian(class_name = "com.bdt.info.JOB")]
    pub struct NumericJob {
        pub title: i32,
    }

    let registry = std::sync::Arc::new(TypeRegistry::new());
    registry.register::<NumericJob>().unwrap();
    let bytes = to_bytes(&job("cto", "facebook")).unwrap();
    let mut decoder = Decoder::new(&bytes).with_registry(registry);
    assert!(matches!(
        decoder.decode(),
        Err(HessianError::TypeMismatch { .. })
    ));
}
