#[allow(dead_code)]
#[derive(calmform::form::FormModel)]
struct TupleForm(String);

fn main() {}
