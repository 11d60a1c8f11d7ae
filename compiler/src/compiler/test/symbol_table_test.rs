use indoc::indoc;

use super::super::ast::symbol::{Symbol, SymbolDataType, SymbolKind};
use super::super::ast::SymbolTable;
use super::compile;

fn symbol(name: &str, data_type: SymbolDataType) -> Symbol {
    Symbol::new(name.to_string(), SymbolKind::Variable, data_type)
}

#[test]
fn insert_stamps_the_scope_label() {
    let mut table = SymbolTable::new();
    table.insert(symbol("x", SymbolDataType::Integer));

    let x = table.lookup("x").expect("x inserted");
    assert_eq!(x.label, "0_");
    assert_eq!(x.target_name(), "W0_x");

    table.add_child_scope();
    table.insert(symbol("y", SymbolDataType::Boolean));
    let y = table.lookup("y").expect("y inserted");
    assert_eq!(y.label, "1_");
    assert_eq!(y.target_name(), "B1_y");
}

#[test]
fn duplicate_insert_fails_silently() {
    let mut table = SymbolTable::new();
    table.insert(symbol("x", SymbolDataType::Integer));
    table.insert(symbol("x", SymbolDataType::Boolean));

    assert_eq!(
        table.lookup("x").expect("x inserted").data_type,
        SymbolDataType::Integer
    );
}

#[test]
fn lookup_walks_the_parent_chain() {
    let mut table = SymbolTable::new();
    table.insert(symbol("x", SymbolDataType::Integer));
    table.add_child_scope();

    assert!(table.lookup("x").is_some());
    assert!(table.lookup_local("x").is_none());

    table.insert(symbol("y", SymbolDataType::Integer));
    table.set_parent_as_current();
    assert!(table.lookup("y").is_none());
}

#[test]
fn update_overwrites_the_nearest_holder() {
    let mut table = SymbolTable::new();
    table.insert(symbol("x", SymbolDataType::Integer));
    table.add_child_scope();

    let mut changed = symbol("x", SymbolDataType::Integer);
    changed.value = String::from("42");
    assert!(table.update("x", changed));

    table.set_parent_as_current();
    let x = table.lookup("x").expect("x still defined in global");
    assert_eq!(x.value, "42");
    assert_eq!(x.label, "0_", "update keeps the stamped label");

    assert!(!table.update("missing", symbol("missing", SymbolDataType::Integer)));
}

#[test]
fn replay_visits_scopes_in_creation_order() {
    let mut table = SymbolTable::new();

    // global -> a(1), b(2) { c(3) }
    table.add_child_scope();
    table.insert(symbol("in_a", SymbolDataType::Integer));
    table.set_parent_as_current();
    table.add_child_scope();
    table.add_child_scope();
    table.insert(symbol("in_c", SymbolDataType::Integer));
    table.set_parent_as_current();
    table.set_parent_as_current();

    table.reset_walk();
    table.enter();
    assert_eq!(table.current_scope(), 1);
    assert!(table.lookup_local("in_a").is_some());
    table.exit();

    table.enter();
    assert_eq!(table.current_scope(), 2);
    table.enter();
    assert_eq!(table.current_scope(), 3);
    assert!(table.lookup_local("in_c").is_some());
    table.exit();
    table.exit();
    assert_eq!(table.current_scope(), 0);
}

#[test]
fn get_property_resolves_across_inheritance() {
    let table = compile(indoc! {r#"
        class Animal {
          let nombre: string;

          function constructor(nombre: string) {
            this.nombre = nombre;
          }
        }

        class Perro : Animal {
          let raza: string;
        }
    "#})
    .symbol_table;

    assert!(table.get_property("Animal", "nombre").is_some());
    assert!(table.get_property("Perro", "raza").is_some());
    // Inherited through the superclass chain.
    assert!(table.get_property("Perro", "nombre").is_some());
    assert!(table.get_property("Perro", "constructor").is_some());
    assert!(table.get_property("Perro", "edad").is_none());
    assert!(table.get_property("nombre", "nombre").is_none());
}

#[test]
fn class_layout_offsets_and_size() {
    let table = compile(indoc! {r#"
        class Registro {
          let etiqueta: string;
          let cuenta: integer;
          let activo: boolean;

          function constructor(etiqueta: string) {
            this.etiqueta = etiqueta;
          }
        }
    "#})
    .symbol_table;

    let registro = table.lookup("Registro").expect("class declared");
    let etiqueta = table.get_property("Registro", "etiqueta").expect("etiqueta");
    let cuenta = table.get_property("Registro", "cuenta").expect("cuenta");
    let activo = table.get_property("Registro", "activo").expect("activo");

    // Offsets follow declaration order; the constructor consumes no space.
    assert_eq!(etiqueta.offset, 0);
    assert_eq!(cuenta.offset, 4);
    assert_eq!(activo.offset, 8);
    assert_eq!(registro.size, 9);

    assert_eq!(etiqueta.kind, SymbolKind::Property);
}

#[test]
fn inherited_properties_precede_new_ones() {
    let table = compile(indoc! {r#"
        class Base {
          let primero: integer;
        }

        class Derivada : Base {
          let segundo: integer;
        }
    "#})
    .symbol_table;

    assert_eq!(table.get_property("Base", "primero").expect("primero").offset, 0);
    assert_eq!(table.get_property("Derivada", "segundo").expect("segundo").offset, 4);
    assert_eq!(table.lookup("Derivada").expect("class").size, 8);
}
