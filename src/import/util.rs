use bson::Bson;

pub fn field_to_bson(field: &str, infer: bool) -> Bson {
    if !infer {
        return Bson::String(field.to_string());
    }
    if let Ok(i) = field.parse::<i64>() {
        return i32::try_from(i).map_or(Bson::Int64(i), Bson::Int32);
    }
    if field.bytes().any(|b| b.is_ascii_digit())
        && let Ok(f) = field.parse::<f64>()
    {
        return Bson::Double(f);
    }
    match field.to_lowercase().as_str() {
        "true" => Bson::Boolean(true),
        "false" => Bson::Boolean(false),
        "" => Bson::Null,
        _ => Bson::String(field.to_string()),
    }
}
