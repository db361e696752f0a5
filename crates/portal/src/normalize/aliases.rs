//! Ordered backend field aliases for each canonical profile field.
//!
//! The lists were collected from the field names the DSO has been seen to
//! send. They are configuration, not contract: a deployment can override any
//! list through the `DSO_FIELD_ALIASES` JSON file, and fields missing from that
//! file keep the defaults below. Earlier entries take precedence.

use serde::{Deserialize, Serialize};

fn list(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

/// Alias lists for every canonical `User` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldAliases {
    pub id: Vec<String>,
    pub name: Vec<String>,
    pub email: Vec<String>,
    pub document: Vec<String>,
    pub donor_type: Vec<String>,
    pub phone: Vec<String>,
    pub address: Vec<String>,
    pub number: Vec<String>,
    pub complement: Vec<String>,
    pub neighborhood: Vec<String>,
    pub city: Vec<String>,
    pub state: Vec<String>,
    pub zip_code: Vec<String>,
    pub country: Vec<String>,
    pub birth_date: Vec<String>,
    pub gender: Vec<String>,
    /// Keys that may hold a nested address object.
    pub address_object: Vec<String>,
    /// Keys that may hold the donor's product list.
    pub products: Vec<String>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            id: list(&["id", "contactId", "donorId", "_id", "codigo"]),
            name: list(&["name", "fullName", "nome", "nomeCompleto"]),
            email: list(&["email", "emailAddress", "e-mail"]),
            document: list(&["cpf", "document", "documentNumber", "documento"]),
            donor_type: list(&["donorType", "donor_type", "tipoDoador", "type"]),
            phone: list(&["phone", "mobilePhone", "cellphone", "celular", "telefone"]),
            address: list(&["street", "address", "logradouro", "endereco", "address1"]),
            number: list(&["number", "addressNumber", "numero"]),
            complement: list(&["complement", "addressComplement", "complemento", "address2"]),
            neighborhood: list(&["neighborhood", "district", "bairro"]),
            city: list(&["city", "cidade", "municipio"]),
            state: list(&["state", "uf", "estado", "province"]),
            zip_code: list(&["cep", "zipCode", "zip", "postalCode"]),
            country: list(&["country", "pais"]),
            birth_date: list(&["birthDate", "dateOfBirth", "birthdate", "dataNascimento"]),
            gender: list(&["gender", "sexo", "genero"]),
            address_object: list(&["address", "endereco", "addressInfo"]),
            products: list(&["products", "produtos", "donations", "subscriptions"]),
        }
    }
}
