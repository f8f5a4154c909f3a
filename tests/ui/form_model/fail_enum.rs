#[allow(dead_code)]
#[derive(calmform::form::FormModel)]
enum ChoiceForm {
    First,
    Second,
}

fn main() {}
