#[allow(dead_code)]
#[derive(calmform::form::FormModel)]
struct GenericForm<T> {
    value: T,
}

fn main() {}
