use sqlx::{query, query_as, PgConnection};

use crate::core::models::institute::{InstituteApplication, InstituteApplicationInsert, InstituteStatus};
use crate::core::models::student::{StudentApplication, StudentApplicationInsert, StudentStatus};
use crate::core::ports::repository::{InstituteStore, StudentStore};
use crate::error::Error;

impl StudentStore for PgConnection {
    async fn find(&mut self, id: i32) -> Result<Option<StudentApplication>, Error> {
        let app = query_as("SELECT * FROM student_applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self)
            .await?;
        Ok(app)
    }

    async fn list_by_status(&mut self, statuses: &[StudentStatus]) -> Result<Vec<StudentApplication>, Error> {
        let names: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        let list = query_as(
            "
        SELECT *
        FROM student_applications
        WHERE status = ANY($1)
        ORDER BY date_submitted DESC",
        )
        .bind(names)
        .fetch_all(&mut *self)
        .await?;
        Ok(list)
    }

    async fn list_by_owner(&mut self, email: &str) -> Result<Vec<StudentApplication>, Error> {
        let list = query_as(
            "
        SELECT *
        FROM student_applications
        WHERE LOWER(email) = LOWER($1)
        ORDER BY date_submitted DESC",
        )
        .bind(email)
        .fetch_all(&mut *self)
        .await?;
        Ok(list)
    }

    async fn list_by_institute(&mut self, institute_code: &str) -> Result<Vec<StudentApplication>, Error> {
        let list = query_as(
            "
        SELECT *
        FROM student_applications
        WHERE institute_code IS NOT NULL AND LOWER(institute_code) = LOWER($1)
        ORDER BY date_submitted DESC",
        )
        .bind(institute_code)
        .fetch_all(&mut *self)
        .await?;
        Ok(list)
    }

    async fn save(&mut self, app: &StudentApplication) -> Result<(), Error> {
        // full-row compare-and-swap on version, so a status never lands
        // without its notes and timestamps, and a lost race surfaces
        let done = query(
            "
        UPDATE student_applications SET
            status = $1,
            admin_notes = $2,
            approved_on = $3,
            last_updated_on = $4,
            scheme_name = $5,
            gender = $6,
            date_of_birth = $7,
            mobile_number = $8,
            aadhar_number = $9,
            institute_name = $10,
            institute_code = $11,
            present_course = $12,
            university_or_board_name = $13,
            previous_class_percentage = $14,
            admission_fee = $15,
            tuition_fee = $16,
            father_name = $17,
            mother_name = $18,
            family_annual_income = $19,
            bank_name = $20,
            ifsc_code = $21,
            bank_account = $22,
            state = $23,
            district = $24,
            pincode = $25,
            photo_path = $26,
            aadhar_path = $27,
            institute_id_card_path = $28,
            previous_marksheet_path = $29,
            fee_receipt_path = $30,
            bank_passbook_path = $31,
            version = version + 1
        WHERE id = $32 AND version = $33",
        )
        .bind(app.status)
        .bind(&app.admin_notes)
        .bind(app.approved_on)
        .bind(app.last_updated_on)
        .bind(&app.scheme_name)
        .bind(&app.gender)
        .bind(app.date_of_birth)
        .bind(&app.mobile_number)
        .bind(&app.aadhar_number)
        .bind(&app.institute_name)
        .bind(&app.institute_code)
        .bind(&app.present_course)
        .bind(&app.university_or_board_name)
        .bind(&app.previous_class_percentage)
        .bind(app.admission_fee)
        .bind(app.tuition_fee)
        .bind(&app.father_name)
        .bind(&app.mother_name)
        .bind(app.family_annual_income)
        .bind(&app.bank_name)
        .bind(&app.ifsc_code)
        .bind(&app.bank_account)
        .bind(&app.state)
        .bind(&app.district)
        .bind(&app.pincode)
        .bind(&app.photo_path)
        .bind(&app.aadhar_path)
        .bind(&app.institute_id_card_path)
        .bind(&app.previous_marksheet_path)
        .bind(&app.fee_receipt_path)
        .bind(&app.bank_passbook_path)
        .bind(app.id)
        .bind(app.version)
        .execute(&mut *self)
        .await?;
        if done.rows_affected() == 0 {
            return Err(Error::Conflict);
        }
        Ok(())
    }

    async fn insert(&mut self, app: StudentApplicationInsert) -> Result<i32, Error> {
        let (id,): (i32,) = query_as(
            "
        INSERT INTO student_applications (
            email, student_name, scheme_name, status, date_submitted,
            gender, date_of_birth, mobile_number, aadhar_number,
            institute_name, institute_code, present_course,
            university_or_board_name, previous_class_percentage,
            admission_fee, tuition_fee, father_name, mother_name,
            family_annual_income, bank_name, ifsc_code, bank_account,
            state, district, pincode, photo_path, aadhar_path,
            institute_id_card_path, previous_marksheet_path,
            fee_receipt_path, bank_passbook_path, version
        ) VALUES (
            $1, $2, $3, $4, NOW(),
            $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
            $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, 1
        ) RETURNING id",
        )
        .bind(&app.email)
        .bind(&app.student_name)
        .bind(&app.scheme_name)
        .bind(StudentStatus::Submitted)
        .bind(&app.gender)
        .bind(app.date_of_birth)
        .bind(&app.mobile_number)
        .bind(&app.aadhar_number)
        .bind(&app.institute_name)
        .bind(&app.institute_code)
        .bind(&app.present_course)
        .bind(&app.university_or_board_name)
        .bind(&app.previous_class_percentage)
        .bind(app.admission_fee)
        .bind(app.tuition_fee)
        .bind(&app.father_name)
        .bind(&app.mother_name)
        .bind(app.family_annual_income)
        .bind(&app.bank_name)
        .bind(&app.ifsc_code)
        .bind(&app.bank_account)
        .bind(&app.state)
        .bind(&app.district)
        .bind(&app.pincode)
        .bind(&app.photo_path)
        .bind(&app.aadhar_path)
        .bind(&app.institute_id_card_path)
        .bind(&app.previous_marksheet_path)
        .bind(&app.fee_receipt_path)
        .bind(&app.bank_passbook_path)
        .fetch_one(&mut *self)
        .await?;
        Ok(id)
    }
}

impl InstituteStore for PgConnection {
    async fn find(&mut self, id: i32) -> Result<Option<InstituteApplication>, Error> {
        let app = query_as("SELECT * FROM institute_applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self)
            .await?;
        Ok(app)
    }

    async fn find_by_code(&mut self, institute_code: &str) -> Result<Option<InstituteApplication>, Error> {
        let app = query_as("SELECT * FROM institute_applications WHERE LOWER(institute_code) = LOWER($1)")
            .bind(institute_code)
            .fetch_optional(&mut *self)
            .await?;
        Ok(app)
    }

    async fn list_by_status(&mut self, statuses: &[InstituteStatus]) -> Result<Vec<InstituteApplication>, Error> {
        let names: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        let list = query_as(
            "
        SELECT *
        FROM institute_applications
        WHERE status = ANY($1)
        ORDER BY submitted_on DESC",
        )
        .bind(names)
        .fetch_all(&mut *self)
        .await?;
        Ok(list)
    }

    async fn save(&mut self, app: &InstituteApplication) -> Result<(), Error> {
        let done = query(
            "
        UPDATE institute_applications SET
            status = $1,
            admin_notes = $2,
            approved_on = $3,
            last_updated_on = $4,
            is_active_login = $5,
            institute_name = $6,
            dise_code = $7,
            state = $8,
            district = $9,
            location = $10,
            institute_type = $11,
            affiliated_university_state = $12,
            university_board_name = $13,
            year_admission_started = $14,
            address = $15,
            principal_name = $16,
            mobile_number = $17,
            telephone = $18,
            establish_certificate_path = $19,
            affiliation_certificate_path = $20,
            declaration_accepted = $21,
            password_hash = $22,
            salt = $23,
            security_question = $24,
            security_answer = $25,
            version = version + 1
        WHERE id = $26 AND version = $27",
        )
        .bind(app.status)
        .bind(&app.admin_notes)
        .bind(app.approved_on)
        .bind(app.last_updated_on)
        .bind(app.is_active_login)
        .bind(&app.institute_name)
        .bind(&app.dise_code)
        .bind(&app.state)
        .bind(&app.district)
        .bind(&app.location)
        .bind(&app.institute_type)
        .bind(&app.affiliated_university_state)
        .bind(&app.university_board_name)
        .bind(app.year_admission_started)
        .bind(&app.address)
        .bind(&app.principal_name)
        .bind(&app.mobile_number)
        .bind(&app.telephone)
        .bind(&app.establish_certificate_path)
        .bind(&app.affiliation_certificate_path)
        .bind(app.declaration_accepted)
        .bind(&app.password_hash)
        .bind(&app.salt)
        .bind(&app.security_question)
        .bind(&app.security_answer)
        .bind(app.id)
        .bind(app.version)
        .execute(&mut *self)
        .await?;
        if done.rows_affected() == 0 {
            return Err(Error::Conflict);
        }
        Ok(())
    }

    async fn insert(&mut self, app: InstituteApplicationInsert) -> Result<i32, Error> {
        let (id,): (i32,) = query_as(
            "
        INSERT INTO institute_applications (
            institute_name, institute_code, dise_code, state, district,
            location, institute_type, affiliated_university_state,
            university_board_name, year_admission_started, address,
            principal_name, mobile_number, telephone,
            establish_certificate_path, affiliation_certificate_path,
            declaration_accepted, status, submitted_on, is_active_login,
            password_hash, salt, security_question, security_answer, version
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
            $15, $16, $17, $18, NOW(), FALSE, $19, $20, $21, $22, 1
        ) RETURNING id",
        )
        .bind(&app.institute_name)
        .bind(&app.institute_code)
        .bind(&app.dise_code)
        .bind(&app.state)
        .bind(&app.district)
        .bind(&app.location)
        .bind(&app.institute_type)
        .bind(&app.affiliated_university_state)
        .bind(&app.university_board_name)
        .bind(app.year_admission_started)
        .bind(&app.address)
        .bind(&app.principal_name)
        .bind(&app.mobile_number)
        .bind(&app.telephone)
        .bind(&app.establish_certificate_path)
        .bind(&app.affiliation_certificate_path)
        .bind(app.declaration_accepted)
        .bind(InstituteStatus::Pending)
        .bind(&app.password_hash)
        .bind(&app.salt)
        .bind(&app.security_question)
        .bind(&app.security_answer)
        .fetch_one(&mut *self)
        .await?;
        Ok(id)
    }
}
