#[allow(dead_code)]
#[derive(calmform::form::FormModel)]
struct BadAttributeForm {
    #[form(flatten)]
    value: String,
}

fn main() {}
