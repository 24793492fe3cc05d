use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct List<T> {
    list: Vec<T>,
    total: i64,
}

impl<T> List<T> {
    pub fn new(list: Vec<T>) -> Self {
        let total = list.len() as i64;
        List { list, total }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub id: i32,
}

/// What a transition operation hands back to the presentation layer.
#[derive(Debug, Serialize)]
pub struct TransitionResponse<S> {
    pub id: i32,
    pub status: S,
}
